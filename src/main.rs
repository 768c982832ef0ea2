use actix::prelude::*;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyCode},
};
use log::{error, info, LevelFilter};
use std::io::Write;
use std::sync::Arc;

use transer::cli;
use transer::core::listener::LogListener;
use transer::core::task::{Command, QueryInFlight, QueryTask, TaskCommand, TaskState, TransferEngine};
use transer::strategy::LocalFileTransfer;
use transer::utils::logger;
use transer::Task;

const PROGRESS_UPDATE_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
const KEYBOARD_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

#[actix::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 解析参数和配置
    let (args, config) = match cli::Args::parse_args() {
        Ok((args, config)) => (args, config),
        Err(e) => {
            eprintln!("参数解析失败: {}", e);
            std::process::exit(1);
        }
    };

    let level = config.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    logger::init_logger(level, &config.log_file)?;
    info!("程序启动");
    info!("配置文件路径: {}", args.config);
    info!("{}", config.get_summary());

    println!("{}", config.get_summary());

    let source = args.source.clone().unwrap_or_default();
    let destination = args.destination.clone().unwrap_or_default();
    let task = Task::new(config.kind, source, destination).with_progress(args.resume_from);
    let handler = LocalFileTransfer::new(config.piece_size);

    let engine = TransferEngine::from_config(task, handler, &config)
        .with_listener(Arc::new(LogListener))
        .start();

    let state = engine.send(Command(TaskCommand::Start)).await?;
    info!("任务已提交, 当前状态 {}", state);

    println!("\n开始传输... (按 'p' 暂停, 'r' 恢复, 's' 停止, 'q' 退出)");
    run_transfer_loop(&engine).await?;

    let task = engine.send(QueryTask).await?;
    println!("{}", serde_json::to_string_pretty(&task)?);
    if let Some(reason) = task.last_error() {
        error!("传输失败: {}", reason);
    }
    info!("程序退出, 任务状态 {}", task.state());

    System::current().stop();
    Ok(())
}

/// 运行传输主循环：处理键盘输入和更新进度
async fn run_transfer_loop(
    engine: &Addr<TransferEngine<LocalFileTransfer>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_update = std::time::Instant::now();

    // 设置终端
    terminal::enable_raw_mode()?;
    execute!(std::io::stdout(), cursor::Hide)?;

    let result = poll_until_settled(engine, &mut last_update).await;

    // 恢复终端
    execute!(std::io::stdout(), cursor::Show)?;
    terminal::disable_raw_mode()?;
    println!();

    result
}

async fn poll_until_settled(
    engine: &Addr<TransferEngine<LocalFileTransfer>>,
    last_update: &mut std::time::Instant,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // 处理键盘输入
        if let Ok(true) = event::poll(KEYBOARD_POLL_INTERVAL) {
            if let Ok(Event::Key(key_event)) = event::read() {
                let command = match key_event.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => {
                        info!("用户主动退出");
                        engine.send(Command(TaskCommand::Stop)).await?;
                        return Ok(());
                    }
                    KeyCode::Char('p') | KeyCode::Char('P') => Some(TaskCommand::Pause),
                    KeyCode::Char('r') | KeyCode::Char('R') => Some(TaskCommand::Resume),
                    KeyCode::Char('s') | KeyCode::Char('S') => Some(TaskCommand::Stop),
                    _ => None,
                };
                if let Some(command) = command {
                    let state = engine.send(Command(command)).await?;
                    info!("用户命令 {:?}, 当前状态 {}", command, state);
                }
            }
        }

        // 更新进度
        if last_update.elapsed() >= PROGRESS_UPDATE_INTERVAL {
            let task = engine.send(QueryTask).await?;
            print_progress(&task)?;

            let in_flight = engine.send(QueryInFlight).await?;
            if !in_flight && (task.state().is_terminal() || task.state() == TaskState::Stopped) {
                return Ok(());
            }
            *last_update = std::time::Instant::now();
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

fn print_progress(task: &Task) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(
        stdout,
        "\r[{}] {:>6.1}%  {} / {} 字节   ",
        task.state(),
        task.progress(),
        task.complete_length(),
        task.length().map(|l| l.to_string()).unwrap_or_else(|| "?".to_string()),
    )?;
    stdout.flush()
}
