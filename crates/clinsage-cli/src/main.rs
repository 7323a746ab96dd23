use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clinsage_core::{
    parse_replace_rules, parse_search_terms, run, Outcome, RunMode, RunOutput, ScanOptions, DEFAULT_EXTENSION,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "clinsage", version, about = "Programmers toolbox: macro usage, term search, search & replace, hardcoding audit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 各模式共用参数
#[derive(Args, Debug)]
struct CommonArgs {
    /// 报告输出目录
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// 目标文件扩展名（忽略大小写）
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// 最大扫描文件大小（单位字节）
    #[arg(long)]
    max_file_size: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检查宏定义目录中的每个宏是否在程序目录中被调用
    MacroUsage {
        /// 宏定义目录（只读第一层）
        #[arg(long)]
        macros: String,

        /// 程序目录（递归）
        #[arg(long)]
        programs: String,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// 在程序目录中搜索词项
    Search {
        /// 程序目录（递归）
        #[arg(long)]
        input: String,

        /// 逗号分隔的搜索词
        #[arg(long)]
        terms: String,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// 搜索并替换（会改写命中的文件）
    Replace {
        /// 程序目录（递归）
        #[arg(long)]
        input: String,

        /// 单条 `search:replace`，可重复；按给定顺序应用
        #[arg(long = "pair")]
        pairs: Vec<String>,

        /// 替换规则文件：每行一个 `search:replace`
        #[arg(long)]
        pairs_file: Option<PathBuf>,

        /// 先写临时文件再 rename 覆盖
        #[arg(long)]
        atomic: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// 硬编码与宏变量误用审计
    Audit {
        /// 程序目录（递归）
        #[arg(long)]
        input: String,

        /// 额外检测规则文件（TOML）
        #[arg(long)]
        rules: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    let (mode, opts, output_dir) = match cli.command {
        Commands::MacroUsage { macros, programs, common } => {
            let mode = RunMode::MacroUsage { macro_dir: macros, program_dir: programs };
            (mode, scan_options(&common), common.output_dir)
        }
        Commands::Search { input, terms, common } => {
            let terms = parse_search_terms(&terms);
            if terms.is_empty() {
                warn!("no search terms supplied");
            }
            (RunMode::TermSearch { root: input, terms }, scan_options(&common), common.output_dir)
        }
        Commands::Replace { input, pairs, pairs_file, atomic, common } => {
            // 文件中的规则在前，命令行 --pair 在后
            let mut spec = String::new();
            if let Some(path) = &pairs_file {
                spec = std::fs::read_to_string(path)
                    .with_context(|| format!("read pairs file {}", path.display()))?;
                spec.push('\n');
            }
            spec.push_str(&pairs.join("\n"));
            let rules = parse_replace_rules(&spec);
            if rules.is_empty() {
                warn!("no valid search:replace pairs supplied");
            }
            let mut opts = scan_options(&common);
            opts.atomic_write = atomic;
            (RunMode::SearchReplace { root: input, rules }, opts, common.output_dir)
        }
        Commands::Audit { input, rules, common } => {
            let mut opts = scan_options(&common);
            opts.rules_path = rules;
            (RunMode::Hardcoding { root: input }, opts, common.output_dir)
        }
    };

    let output = run(&mode, &opts).context("run failed")?;
    report_outcome(&output, &output_dir)
}

fn scan_options(common: &CommonArgs) -> ScanOptions {
    ScanOptions {
        extension: common.extension.clone(),
        max_file_size: common.max_file_size,
        ..ScanOptions::default()
    }
}

/// 导出报告并输出结果信号与诊断
fn report_outcome(output: &RunOutput, output_dir: &Path) -> Result<()> {
    for diag in &output.diagnostics {
        warn!("{diag}");
    }
    match output.outcome() {
        Outcome::Success => {
            let path = output.report.export(output_dir).context("export report")?;
            if let Some(path) = path {
                info!(path = %path.display(), rows = output.report.detail_rows(), "Task completed successfully.");
            }
        }
        Outcome::NoMatches => warn!("No matches found or no data generated."),
    }
    if output.has_warnings() {
        warn!(count = output.diagnostics.len(), "Completed with per-file warnings; see above.");
    }
    info!(
        files_scanned = output.stats.files_scanned,
        files_failed = output.stats.files_failed,
        files_rewritten = output.stats.files_rewritten,
        "summary"
    );
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
