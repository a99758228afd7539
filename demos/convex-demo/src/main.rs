use convex_demo::client::{FakeTransport, WanAndroidClient};
use convex_demo::service::WanAndroidService;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "convex=warn".into()))
        .compact()
        .init();

    let client = WanAndroidClient::new(FakeTransport::sample());
    println!("Registered transformers:");
    for id in convex::global().ids() {
        println!("  {}", id);
    }

    for article in client.articles(0)? {
        println!("#{} {} by {}", article.id, article.title, article.author);
    }
    for banner in client.banners()? {
        println!("banner: {} -> {}", banner.title, banner.url);
    }
    for key in client.hot_keys()? {
        println!("hot key {}: {}", key.order, key.name);
    }
    match client.articles(1) {
        Ok(_) => println!("page 1 unexpectedly succeeded"),
        Err(e) => println!("page 1 failed: {}", e),
    }
    Ok(())
}
