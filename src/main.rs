use clap::Parser;
use std::io::Read;
use std::path::Path;
use tracer::{api, cli, config, error, export, logging, render, scanner, session};
use api::ApiClient;
use cli::{Cli, Commands, RentalAction};
use config::Config;
use error::{Result, TracerError};
use session::SessionStore;
use tracer_common::{classify, parse_rental_names, Classification, QrList};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("✘ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = SessionStore::default_location()?;

    match cli.command {
        Commands::Link { key } => {
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            println!("- 接続中... ({})", client.base_url());
            let session = client.link(&key).await?;
            store.save(&session)?;
            println!("✔ Connected successfully");
        }

        Commands::Unlink => {
            if store.clear()? {
                println!("✔ リンクを解除しました");
            } else {
                println!("リンクされていません");
            }
        }

        Commands::Scan { input, yes } => {
            let session = store.load()?;
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            let writer = scanner::BackendWriter { client: &client, session: &session };

            println!("📷 tracer - スキャン（レンタル品と学生のQRを読み取ってください）\n");
            let summary = match input {
                Some(path) => {
                    let file = std::fs::File::open(&path)?;
                    let source = scanner::LineSource::new(std::io::BufReader::new(file));
                    run_scan(source, yes, &writer).await
                }
                None => {
                    let source = scanner::LineSource::new(std::io::stdin().lock());
                    run_scan(source, yes, &writer).await
                }
            };
            let summary = guard_session(&store, summary)?;

            println!(
                "\n✅ 送信 {}件 / 失敗 {}件 / 取消 {}件",
                summary.submitted, summary.failed, summary.cancelled
            );
        }

        Commands::Logs => {
            let session = store.load()?;
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            let logs = guard_session(&store, client.logs(&session).await)?;

            println!("{:>5}  {:<16} {:<6} {:<24} {:<12} {}", "ID", "Rental", "Action", "Student", "Date", "Time");
            for log in &logs {
                println!(
                    "{:>5}  {:<16} {:<6} {:<24} {:<12} {}",
                    log.id, log.rental, log.action, log.student, log.date, log.time
                );
            }
            println!("\n{}件", logs.len());
        }

        Commands::Status => {
            let session = store.load()?;
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            let status = guard_session(&store, client.status(&session).await)?;

            println!("{:<16} {:<6} {}", "Rental", "Status", "Renter");
            for s in &status {
                println!("{:<16} {:<6} {}", s.rental, s.status, s.renter);
            }
            println!("\n{}件", status.len());
        }

        Commands::Rentals { action } => {
            let session = store.load()?;
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            match action {
                RentalAction::Add { names, file } => {
                    let file_content = match file {
                        Some(path) => std::fs::read_to_string(path)?,
                        None => String::new(),
                    };
                    let rentals = parse_rental_names(
                        names.iter().map(String::as_str).chain(std::iter::once(file_content.as_str())),
                    );
                    if rentals.is_empty() {
                        return Err(TracerError::Config("Name required".into()));
                    }
                    let message = guard_session(&store, client.add_rentals(&session, &rentals).await)?;
                    println!("✔ {} ({}件)", message, rentals.len());
                }
                RentalAction::Remove { name } => {
                    let message = guard_session(&store, client.remove_rental(&session, name.trim()).await)?;
                    println!("✔ {}: {}", name.trim(), message);
                }
            }
        }

        Commands::ExportLogs { output } => {
            let session = store.load()?;
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            let csv = guard_session(&store, client.export_csv(&session).await)?;
            std::fs::write(&output, csv)?;
            println!("✔ CSV出力: {}", output.display());
        }

        Commands::ClearLogs { yes } => {
            let session = store.load()?;
            let proceed = yes
                || dialoguer::Confirm::new()
                    .with_prompt("Delete all logs?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if !proceed {
                println!("中止しました");
                return Ok(());
            }
            let client = ApiClient::new(&config.base_url, config.timeout_seconds)?;
            let message = guard_session(&store, client.clear_logs(&session).await)?;
            println!("✔ {}", message);
        }

        Commands::Qr { labels, paste, range_base, start, end, mode, output, images } => {
            println!("🔳 tracer - QRコード生成 (モード: {})\n", mode);

            let mut list = QrList::new(mode);

            // 1. 単体追加
            for label in &labels {
                match list.add_manual(label) {
                    Ok(true) => {}
                    Ok(false) => println!("  skip (duplicate): {}", label.trim()),
                    Err(e) => println!("  ✘ {}", e),
                }
            }

            // 2. 貼り付け
            if let Some(path) = paste {
                let text = read_paste(&path)?;
                match list.import_paste(&text) {
                    Ok(n) => println!("- {}件を取り込み", n),
                    Err(e) => println!("  ✘ {}", e),
                }
            }

            // 3. 連番生成
            if let Some((base, start, end)) = cli::range_request(range_base, start, end) {
                match list.generate_range(&base, start, end) {
                    Ok(n) => println!("- {}件を生成", n),
                    Err(e) => println!("  ✘ {}", e),
                }
            }

            if list.is_empty() {
                println!("出力するQRコードがありません");
                return Ok(());
            }

            println!("[1/2] {}件を描画中...", list.len());
            let options = render::RenderOptions::from(&config);
            let rendered = render::render_batch(list.items(), &options, true);
            if rendered.len() < list.len() {
                println!("  {}件は描画できずスキップしました", list.len() - rendered.len());
            }
            println!("✔ 描画完了\n");

            println!("[2/2] 書き出し中...");
            let zip_path = export::write_zip(&rendered, &output)?;
            println!("✔ ZIP出力: {}", zip_path.display());
            if let Some(dir) = images {
                let paths = export::write_images(&rendered, &dir)?;
                println!("✔ PNG出力: {} ({}件)", dir.display(), paths.len());
            }

            println!("\n✅ 完了");
        }

        Commands::Decode { payload } => match classify(&payload) {
            Some(Classification::RentalId(id)) => println!("rental:  {}", id),
            Some(Classification::StudentEncoded { name, .. }) => println!("student: {}", name),
            None => println!("(not a rental or student code)"),
        },

        Commands::Config { set_base_url, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ 接続先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  接続先: {}", config.base_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  QRサイズ: {}px", config.qr_size);
                println!("  ラベル最大文字数: {}", config.label_max_chars);
                println!("  リンク: {}", if store.is_linked() { "済み" } else { "未" });
            }
        }
    }

    Ok(())
}

async fn run_scan<S: scanner::ScanSource>(
    source: S,
    yes: bool,
    writer: &scanner::BackendWriter<'_>,
) -> Result<scanner::ScanSummary> {
    let mut session = scanner::ScanSession::new(source);
    if yes {
        session.run(&mut scanner::AutoConfirm, writer).await
    } else {
        session.run(&mut scanner::PromptConfirm, writer).await
    }
}

/// 401ならセッションを破棄する
fn guard_session<T>(store: &SessionStore, result: Result<T>) -> Result<T> {
    if let Err(TracerError::Unauthorized) = &result {
        if let Err(e) = store.clear() {
            tracing::warn!(error = %e, "failed to clear session");
        }
    }
    result
}

fn read_paste(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
