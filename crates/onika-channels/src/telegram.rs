//! Telegram front-end via `teloxide` long polling.
//!
//! Text messages are routed; commands are answered from [`crate::commands`].
//! Each routed message runs on its own task so a slow route never blocks the
//! polling loop, and is abandoned after the configured reply deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ChatAction, ParseMode, UpdateKind};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use onika_core::config::TelegramConfig;
use onika_router::{RouteOutcome, Router, StatusReporter};

use crate::access::AllowList;
use crate::base::Channel;
use crate::commands::{self, Command};
use crate::formatting::{outcome_chunks, ReplyChunk};

/// Telegram refreshes "typing…" for about five seconds.
const TYPING_REFRESH: Duration = Duration::from_secs(4);

// ─────────────────────────────────────────────
// TelegramChannel
// ─────────────────────────────────────────────

pub struct TelegramChannel {
    token: String,
    router: Arc<Router>,
    status: StatusReporter,
    allow: AllowList,
    reply_timeout: Duration,
    shutdown: Arc<Notify>,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig, router: Arc<Router>) -> Self {
        let status = StatusReporter::for_router(&router);
        Self {
            token: config.token.clone(),
            router,
            status,
            allow: AllowList::new(config.allowed_users.clone()),
            reply_timeout: Duration::from_secs(config.reply_timeout_secs.max(1)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    async fn handle_update(&self, bot: &Bot, update: &Update) {
        let UpdateKind::Message(message) = &update.kind else {
            return;
        };
        let Some(user) = message.from.as_ref() else {
            return;
        };
        let Some(text) = message.text() else {
            debug!("ignoring non-text telegram message");
            return;
        };

        let username = user.username.as_deref().unwrap_or("");
        let sender_id = format!("{}|{}", user.id.0, username);
        let chat = message.chat.id;

        if !self.allow.is_allowed(&sender_id) {
            warn!(sender = %sender_id, chat = chat.0, "telegram message from unauthorized user, ignoring");
            return;
        }

        match Command::parse(text) {
            None => self.spawn_route(bot, chat, text.to_string()),
            Some(command) => self.handle_command(bot, chat, &user.first_name, command).await,
        }
    }

    async fn handle_command(&self, bot: &Bot, chat: ChatId, first_name: &str, command: Command) {
        debug!(?command, chat = chat.0, "telegram command");
        match &command {
            Command::Start => {
                let view = self.status.snapshot();
                send_html(bot, chat, &commands::welcome_html(first_name, &view)).await;
            }
            Command::Status => {
                send_html(bot, chat, &self.status.snapshot().render_html()).await;
            }
            Command::Help => send_html(bot, chat, &commands::help_html()).await,
            Command::Radar => send_html(bot, chat, &commands::radar_html()).await,
            Command::Create(topic) => {
                send_html(bot, chat, &commands::create_ack_html(topic)).await;
            }
            Command::Hello => {}
            Command::Unknown(name) => {
                debug!(command = %name, "unknown telegram command");
                return;
            }
        }

        if let Some(prompt) = command.prompt() {
            self.spawn_route(bot, chat, prompt);
        }
    }

    fn spawn_route(&self, bot: &Bot, chat: ChatId, prompt: String) {
        let bot = bot.clone();
        let router = self.router.clone();
        let deadline = self.reply_timeout;
        tokio::spawn(async move {
            let outcome = route_with_typing(&bot, chat, &router, &prompt, deadline).await;
            let chunks = match &outcome {
                Some(outcome) => outcome_chunks(outcome),
                None => vec![ReplyChunk::text(&router.settings().fallback_message)],
            };
            send_chunks(&bot, chat, &chunks).await;
        });
    }
}

/// Route `prompt` while showing "typing…". `None` if the deadline passed.
async fn route_with_typing(
    bot: &Bot,
    chat: ChatId,
    router: &Router,
    prompt: &str,
    deadline: Duration,
) -> Option<RouteOutcome> {
    let typing_bot = bot.clone();
    let typing = tokio::spawn(async move {
        loop {
            let _ = typing_bot.send_chat_action(chat, ChatAction::Typing).await;
            tokio::time::sleep(TYPING_REFRESH).await;
        }
    });

    let outcome = tokio::time::timeout(deadline, router.route(prompt)).await;
    typing.abort();

    match outcome {
        Ok(outcome) => {
            if let RouteOutcome::Failure {
                attempted_errors, ..
            } = &outcome
            {
                warn!(chat = chat.0, errors = ?attempted_errors, "route failed");
            }
            Some(outcome)
        }
        Err(_) => {
            warn!(chat = chat.0, deadline_secs = deadline.as_secs(), "route abandoned after deadline");
            None
        }
    }
}

/// Send a short HTML reply built by this crate.
async fn send_html(bot: &Bot, chat: ChatId, html: &str) {
    send_chunks(bot, chat, &[ReplyChunk::html(html)]).await;
}

/// Send each chunk as HTML, falling back to its plain form if Telegram
/// rejects the markup.
async fn send_chunks(bot: &Bot, chat: ChatId, chunks: &[ReplyChunk]) {
    for chunk in chunks {
        let sent = bot
            .send_message(chat, chunk.html.clone())
            .parse_mode(ParseMode::Html)
            .await;
        if let Err(e) = sent {
            debug!(error = %e, "HTML send failed, retrying as plain text");
            if let Err(e) = bot.send_message(chat, chunk.plain.clone()).await {
                error!(error = %e, chat = chat.0, "telegram send failed");
                return;
            }
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("starting telegram channel (long polling)");

        let bot = Bot::new(&self.token);

        let menu = commands::MENU
            .iter()
            .map(|(command, description)| BotCommand::new(*command, *description))
            .collect::<Vec<_>>();
        if let Err(e) = bot.set_my_commands(menu).await {
            warn!(error = %e, "failed to set bot commands menu");
        }

        let mut offset: i32 = 0;
        loop {
            tokio::select! {
                updates = bot.get_updates().offset(offset).timeout(30).send() => {
                    match updates {
                        Ok(updates) => {
                            for update in &updates {
                                offset = (update.id.0 as i32).wrapping_add(1);
                                self.handle_update(&bot, update).await;
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "telegram polling error");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("telegram channel shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        info!("stopping telegram channel");
        self.shutdown.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onika_core::config::schema::default_layers;
    use onika_core::config::RouterSettings;
    use onika_providers::{AttemptResult, LayerDescriptor, LayerRegistry, UpstreamClient};
    use onika_router::BudgetTracker;

    struct Echo;

    #[async_trait]
    impl UpstreamClient for Echo {
        async fn call(&self, layer: &LayerDescriptor, message: &str) -> AttemptResult {
            AttemptResult::success(layer, message, Duration::ZERO, 0.0)
        }
    }

    fn channel(allowed: Vec<String>, reply_timeout_secs: u64) -> TelegramChannel {
        let router = Router::new(
            Arc::new(LayerRegistry::from_config(&default_layers()).unwrap()),
            Arc::new(BudgetTracker::new(1.0)),
            Arc::new(Echo),
            RouterSettings::default(),
        )
        .unwrap();
        let config = TelegramConfig {
            token: "test_token".into(),
            allowed_users: allowed,
            reply_timeout_secs,
        };
        TelegramChannel::new(&config, Arc::new(router))
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(channel(vec![], 120).name(), "telegram");
    }

    #[test]
    fn test_allow_list_from_config() {
        let ch = channel(vec!["123456".into(), "johndoe".into()], 120);
        assert!(ch.allow.is_allowed("123456|someone"));
        assert!(ch.allow.is_allowed("1|johndoe"));
        assert!(!ch.allow.is_allowed("1|stranger"));
    }

    #[test]
    fn test_zero_reply_timeout_is_clamped() {
        assert_eq!(channel(vec![], 0).reply_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_status_shares_router_state() {
        let ch = channel(vec![], 120);
        ch.router.budget().charge(0.4);
        assert!((ch.status.snapshot().accrued - 0.4).abs() < 1e-9);
    }
}
