use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use posture_monitor::config::Config;
use posture_monitor::image_io::{read_image, write_image};
use posture_monitor::message::{lean_payload, PostureReport};
use posture_monitor::pose::OnnxPoseModel;
use posture_monitor::PostureContext;

/// 画像から姿勢（背骨の傾き・膝立ち・手組み）を判定する
#[derive(Parser, Debug)]
#[command(name = "posture_analyze", version = env!("POSTURE_MONITOR_VERSION"))]
struct Args {
    /// 設定ファイル（省略時は既定値）
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 設定のモデルパスを上書き
    #[arg(short, long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// 描画済み画像の保存先（設定を上書き）
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// 判定をJSONで出力
    #[arg(long)]
    json: bool,

    /// デバッグログを有効化
    #[arg(short, long)]
    verbose: bool,

    /// 入力画像
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

impl Args {
    fn overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model.path = model.display().to_string();
        }
        if let Some(dir) = &self.output_dir {
            config.output.processed_dir = dir.display().to_string();
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logger: {e}"))
}

fn load_config(args: &Args) -> Result<Config> {
    // 明示されたファイルが読めなければ画像処理前にエラー終了
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            info!("no config file given, using defaults");
            Config::default()
        }
    };
    args.overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn process_image(
    context: &PostureContext<OnnxPoseModel>,
    path: &Path,
    output_dir: &Path,
    json: bool,
) -> Result<()> {
    let image = read_image(path)?;
    let analysis = context.analyze(image.view())?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let out_path = output_dir.join(file_name);
    write_image(&out_path, analysis.annotated.view())?;
    info!(output = %out_path.display(), "saved annotated image");

    if json {
        println!("{}", PostureReport::from(&analysis.result).to_json()?);
    } else {
        match lean_payload(&analysis.result) {
            Some(payload) => println!("{}: {}", path.display(), payload),
            None => println!("{}: undetermined", path.display()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    // 設定とモデルは起動時に一度だけ読み込む。失敗したら画像処理前に終了
    let config = load_config(&args).context("invalid configuration")?;
    let model = OnnxPoseModel::new(&config.model.path)?;
    let context = PostureContext::new(config, model)?;
    let output_dir = PathBuf::from(&context.config().output.processed_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut failed = 0usize;
    for path in &args.images {
        info!(image = %path.display(), "processing image");
        if let Err(e) = process_image(&context, path, &output_dir, args.json) {
            warn!(image = %path.display(), error = %e, "skipping image");
            failed += 1;
        }
    }

    info!(
        processed = args.images.len() - failed,
        failed,
        "done"
    );
    Ok(())
}
