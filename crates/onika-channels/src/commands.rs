//! Bot commands and their canned replies.
//!
//! Parsing and text live here, apart from any chat SDK, so every front-end
//! answers the same way.

use std::fmt::Write;

use onika_router::StatusView;

use crate::formatting::escape_html;

/// Prompt routed by `/hello`.
pub const HELLO_PROMPT: &str = "用一句话介绍你自己";

/// Topic used by `/create` when none is given.
pub const DEFAULT_CREATE_TOPIC: &str = "今日摇滚热点";

const RULE: &str = "━━━━━━━━━━━━━━";

/// A parsed slash command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Hello,
    /// `/create [topic]`, topic already defaulted.
    Create(String),
    Radar,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse `text` as a command. Returns `None` for ordinary messages.
    ///
    /// Handles the `/cmd@botname` form used in groups.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let (head, args) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        Some(match name {
            "/start" => Command::Start,
            "/status" => Command::Status,
            "/hello" => Command::Hello,
            "/create" => Command::Create(if args.is_empty() {
                DEFAULT_CREATE_TOPIC.to_string()
            } else {
                args.split_whitespace().collect::<Vec<_>>().join(" ")
            }),
            "/radar" => Command::Radar,
            "/help" => Command::Help,
            other => Command::Unknown(other.to_string()),
        })
    }

    /// The prompt to route for commands that need a model answer.
    pub fn prompt(&self) -> Option<String> {
        match self {
            Command::Hello => Some(HELLO_PROMPT.to_string()),
            Command::Create(topic) => Some(create_prompt(topic)),
            _ => None,
        }
    }
}

/// Prompt for `/create`.
pub fn create_prompt(topic: &str) -> String {
    format!("生成一段关于'{topic}'的摇滚风格内容，100字左右，带emoji")
}

/// `/start` reply: greeting plus a one-line-per-layer summary.
pub fn welcome_html(first_name: &str, view: &StatusView) -> String {
    let mut out = format!(
        "🎸 <b>ÖNIKA LI 已激活</b>\n{RULE}\n你好 {}！多层AI融合体 · 故障自愈\n\n<b>当前状态：</b>\n",
        escape_html(first_name)
    );
    for layer in &view.layers {
        let mark = if layer.configured { "✅" } else { "⏸️" };
        let _ = writeln!(
            out,
            "{mark} Layer {} ({}){}",
            layer.ordinal,
            escape_html(&layer.display_name),
            if layer.is_free { "" } else { " 💰" },
        );
    }
    out.push_str("\n输入 /help 查看所有指令");
    out
}

/// `/create` acknowledgement sent before routing.
pub fn create_ack_html(topic: &str) -> String {
    format!(
        "🎸 <b>ÖNIKA LI 生成中...</b>\n主题：{}\n{RULE}",
        escape_html(topic)
    )
}

pub fn radar_html() -> String {
    format!("🎸 <b>ÖNIKA LI 信息雷达</b>\n{RULE}\n扫描中...\n\n<i>（功能开发中）</i>")
}

pub fn help_html() -> String {
    format!(
        "🎸 <b>ÖNIKA LI 指令列表</b>\n{RULE}\n\n\
         <b>基础指令：</b>\n\
         /start - 启动系统\n\
         /status - 查看各层状态\n\
         /hello - 测试AI对话\n\
         /help - 显示帮助\n\n\
         <b>内容创作：</b>\n\
         /create [主题] - 生成内容\n\
         /radar - 启动信息雷达\n\n\
         <b>直接发消息 = AI对话</b>\n\n\
         <i>故障时会自动切换备用模型</i>"
    )
}

/// Command menu entries as `(command, description)`.
pub const MENU: &[(&str, &str)] = &[
    ("start", "启动系统"),
    ("status", "查看各层状态"),
    ("hello", "测试AI对话"),
    ("create", "生成内容"),
    ("radar", "启动信息雷达"),
    ("help", "显示帮助"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use onika_router::LayerStatus;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /status "), Some(Command::Status));
        assert_eq!(Command::parse("/help@onika_bot"), Some(Command::Help));
        assert_eq!(Command::parse("/radar now"), Some(Command::Radar));
    }

    #[test]
    fn test_create_topic() {
        assert_eq!(
            Command::parse("/create  摇滚   新闻 "),
            Some(Command::Create("摇滚 新闻".into()))
        );
        assert_eq!(
            Command::parse("/create"),
            Some(Command::Create(DEFAULT_CREATE_TOPIC.into()))
        );
        assert_eq!(
            Command::parse("/create@onika_bot"),
            Some(Command::Create(DEFAULT_CREATE_TOPIC.into()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/reset"),
            Some(Command::Unknown("/reset".into()))
        );
    }

    #[test]
    fn test_prompts() {
        assert_eq!(Command::Hello.prompt().as_deref(), Some(HELLO_PROMPT));
        assert_eq!(
            Command::Create("朋克".into()).prompt().unwrap(),
            "生成一段关于'朋克'的摇滚风格内容，100字左右，带emoji"
        );
        assert_eq!(Command::Status.prompt(), None);
    }

    #[test]
    fn test_welcome_lists_layers() {
        let view = StatusView {
            layers: vec![
                LayerStatus {
                    ordinal: 1,
                    display_name: "Kimi K2".into(),
                    model_id: "moonshotai/kimi-k2:free".into(),
                    provider: "OpenRouter".into(),
                    is_free: true,
                    configured: true,
                },
                LayerStatus {
                    ordinal: 2,
                    display_name: "Claude <Sonnet>".into(),
                    model_id: "claude".into(),
                    provider: "Anthropic".into(),
                    is_free: false,
                    configured: false,
                },
            ],
            daily_limit: 1.0,
            accrued: 0.0,
            remaining: 1.0,
        };

        let html = welcome_html("Ana", &view);
        assert!(html.contains("你好 Ana"));
        assert!(html.contains("✅ Layer 1 (Kimi K2)\n"));
        assert!(html.contains("⏸️ Layer 2 (Claude &lt;Sonnet&gt;) 💰"));
    }

    #[test]
    fn test_help_mentions_every_menu_command() {
        let help = help_html();
        for (command, _) in MENU {
            assert!(help.contains(&format!("/{command}")), "missing /{command}");
        }
    }
}
