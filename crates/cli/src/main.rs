use std::io::Write;

fn main() -> anyhow::Result<()> {
    posttrade_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = posttrade_cli::ReplayRequest::from_args(&args)?;
    let output = posttrade_cli::run(&request)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output.render())?;
    stdout.flush()?;
    Ok(())
}
