#[tokio::main]
async fn main() -> anyhow::Result<()> {
    alarm_calldata::node::run_cli().await
}
