use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match palaver_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("palaver: {}", e);
            ExitCode::FAILURE
        }
    }
}
