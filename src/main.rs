#[actix_web::main]
async fn main() -> std::io::Result<()> {
    misspellings_dashboard::run().await
}
