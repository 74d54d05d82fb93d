use std::path::{Path, PathBuf};
use std::sync::Arc;

use adminui::api::{ActionDispatcher, Browser, DispatcherSettings, HttpTransport, Outcome};
use adminui::config::PanelConfig;
use adminui::dom::Document;
use adminui::notify::{NotificationPresenter, NotificationTiming};
use adminui::page::slug;
use clap::{Parser, Subcommand};

mod terminal;

#[derive(Parser)]
#[command(name = "adminui", about = "新闻站点后台操作命令行", version = long_version())]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "adminui.toml")]
    config: PathBuf,

    /// 覆盖配置中的后台地址
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Action(ActionCommand),

    /// 由标题生成 slug
    Slug { title: String },

    /// 检查配置文件
    Check,
}

/// 需要请求后台的操作
#[derive(Subcommand)]
enum ActionCommand {
    /// 删除一项内容
    Delete {
        /// 资源地址，如 /admin/posts
        #[arg(long)]
        url: String,
        #[arg(long)]
        id: String,
        /// 自定义确认提示
        #[arg(long)]
        message: Option<String>,
        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },

    /// 修改内容状态
    Status {
        #[arg(long)]
        url: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: String,
    },

    /// 对多项内容执行批量操作
    Bulk {
        #[arg(long)]
        url: String,
        #[arg(long)]
        action: String,
        /// 逗号分隔的 id 列表
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
    },

    /// 提交新的排序
    Order {
        #[arg(long)]
        url: String,
        /// JSON 数组，如 '[{"id":1,"order":0}]'
        #[arg(long)]
        items: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PanelConfig::load_or_default(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .init();

    match cli.command {
        Commands::Slug { title } => {
            println!("{}", slug::generate_slug(&title));
            Ok(())
        }
        Commands::Check => check(&cli.config, &config),
        Commands::Action(action) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_action(config, action)),
    }
}

fn check(path: &Path, config: &PanelConfig) -> anyhow::Result<()> {
    let problems = config.validate();
    for p in &problems {
        tracing::error!("{p}");
    }
    if problems.is_empty() {
        tracing::info!("配置检查通过：{}", path.display());
        Ok(())
    } else {
        anyhow::bail!("配置检查未通过：{} 个错误", problems.len())
    }
}

async fn run_action(config: PanelConfig, command: ActionCommand) -> anyhow::Result<()> {
    let mut doc = Document::new();
    let body = doc.body();
    let container = doc.build(body, "div").class("notification-container").finish();
    let document = doc.into_shared();

    let presenter = NotificationPresenter::new(
        document.clone(),
        container,
        NotificationTiming::from(&config.notification),
    );
    let assume_yes = matches!(command, ActionCommand::Delete { yes: true, .. });
    let browser = Browser {
        document,
        navigator: Arc::new(terminal::LoggingNavigator),
        confirmer: Arc::new(terminal::TerminalConfirm { assume_yes }),
    };
    let transport = Arc::new(HttpTransport::new(&config.server.base_url)?);
    let dispatcher = ActionDispatcher::new(
        transport,
        presenter,
        browser,
        DispatcherSettings::from_config(&config),
    );

    let outcome = match command {
        ActionCommand::Delete {
            url, id, message, ..
        } => dispatcher.delete_item(&url, &id, message.as_deref()).await,
        ActionCommand::Status { url, id, status } => dispatcher.update_status(&url, &id, &status).await,
        ActionCommand::Bulk { url, action, ids } => {
            dispatcher.bulk_action(&url, &action, &selected_ids(ids)).await
        }
        ActionCommand::Order { url, items } => {
            let items: Vec<serde_json::Value> = serde_json::from_str(&items)
                .map_err(|e| anyhow::anyhow!("解析排序数据失败：{}", e))?;
            dispatcher.update_order(&url, &items).await
        }
    };

    dispatcher.settle().await;

    match outcome? {
        Outcome::Completed(result) => {
            if let Some(target) = result.redirect_target() {
                tracing::info!("服务端要求跳转：{}", target);
            }
        }
        Outcome::Declined => tracing::info!("已取消"),
        Outcome::NothingSelected => anyhow::bail!("没有指定任何 id"),
    }
    Ok(())
}

/// `--ids ''` 或 `--ids 1,,2` 会解析出空串，这些不算选中
fn selected_ids(ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

const fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\ncommit:  ",
        env!("ADMINUI_GIT_COMMIT"),
        "\nbuild:   ",
        env!("ADMINUI_BUILD_TIME"),
        "\ntarget:  ",
        env!("ADMINUI_BUILD_TARGET"),
        "\nprofile: ",
        env!("ADMINUI_BUILD_PROFILE"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_ids(raw: &str) -> Vec<String> {
        let cli = Cli::try_parse_from([
            "adminui", "bulk", "--url", "/posts/bulk", "--action", "publish", "--ids", raw,
        ])
        .unwrap();
        match cli.command {
            Commands::Action(ActionCommand::Bulk { ids, .. }) => selected_ids(ids),
            _ => panic!("应解析为 bulk 子命令"),
        }
    }

    #[test]
    fn blank_ids_count_as_nothing_selected() {
        assert!(bulk_ids("").is_empty());
        assert!(bulk_ids(" , ").is_empty());
    }

    #[test]
    fn ids_are_split_and_trimmed() {
        assert_eq!(bulk_ids("1, ,2,"), vec!["1", "2"]);
        assert_eq!(bulk_ids("42"), vec!["42"]);
    }
}
