//! Simplify one arithmetic expression with the engine
//!
//! Expects a built `./rbe` and a `test2.rbe` rule database in the current
//! directory.
//!
//! ```sh
//! RUST_LOG=rbe_interface=debug cargo run -p rbe-interface --example optimize_expression
//! ```

use rbe_interface::start_process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut session = start_process(&["test2.rbe"], "0", "-1").await?;

    let tokens = [
        "(", "(", "4", "+", "2", ")", "^", "2", "+", "2", "^", "2", ")", "+", "(", "(", "4", "+",
        "2", ")", "^", "2", "+", "2", "^", "2", ")",
    ];
    let result = session.optimize_tokens(&tokens).await?;

    println!("RESULT:");
    println!("{}", result);

    session.close().await?;
    Ok(())
}
