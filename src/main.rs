use order_repository::config::AppConfig;
use order_repository::infrastructure::logger::Logger;
use order_repository::{OrderRepository, PostgresOrderRepository};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::find_file();
    let config = AppConfig::load(config_path.as_deref())?;
    Logger::init(&config.logging.filter);

    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let args: Vec<String> = env::args().collect();
    let account_id = match args.get(1) {
        Some(account_id) => account_id.clone(),
        None => {
            print_usage();
            return Ok(());
        }
    };

    let repository = PostgresOrderRepository::open(&config.repository)
        .await
        .map_err(|e| {
            error!("Failed to open order repository: {}", e);
            e
        })?;

    let result = repository.get_orders_for_account(&account_id).await;
    repository.close().await;

    let orders = result?;
    println!("{}", serde_json::to_string_pretty(&orders)?);
    Ok(())
}

fn print_usage() {
    println!("用法: order-repository <account_id>");
    println!();
    println!("输出该账户下全部订单（JSON）。");
    println!("配置文件: order-repository.toml 或 ./config/order-repository.toml");
    println!("环境变量: DATABASE_URL 覆盖数据库地址，RUST_LOG 覆盖日志过滤");
}
