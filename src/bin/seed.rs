//! Seed tool: generate a realistic multi-region payout batch, submit it to
//! a running engine and start processing.
//!
//! Usage: `seed [count]` (default 1000). Override the target with BASE_URL.

use rand::Rng;
use serde_json::{Value, json};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    let base_url =
        std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let currencies = ["IDR", "PHP", "VND"];
    let banks = [
        "BCA",
        "Mandiri",
        "BNI",
        "BDO",
        "Metrobank",
        "Vietcombank",
        "Techcombank",
    ];
    let regions = ["ID", "PH", "VN"];

    let mut rng = rand::thread_rng();
    let payouts: Vec<Value> = (0..count)
        .map(|i| {
            let region = regions[rng.gen_range(0..regions.len())];
            json!({
                "vendor_id": format!("vendor_{}_{:05}", region, i + 1),
                "vendor_name": format!("Vendor {} #{}", region, i + 1),
                "amount": (rng.gen_range(10_000..510_000) as f64) / 100.0,
                "currency": currencies[rng.gen_range(0..currencies.len())],
                "bank_account": format!("{}{:012}", region, rng.gen_range(0..999_999_999_999u64)),
                "bank_name": banks[rng.gen_range(0..banks.len())],
            })
        })
        .collect();

    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/v1/batches", base_url))
        .json(&json!({ "payouts": payouts }))
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Create batch response ({}):\n{:#}", status, body);

    let Some(batch_id) = body["batch_id"].as_str() else {
        anyhow::bail!("No batch_id in response");
    };

    println!("\nStarting batch {}...", batch_id);
    let resp = client
        .post(format!("{}/api/v1/batches/{}/start", base_url, batch_id))
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Start response ({}):\n{:#}", status, body);

    println!("\nMonitor at: GET {}/api/v1/batches/{}", base_url, batch_id);
    println!(
        "Failed payouts: GET {}/api/v1/batches/{}/payouts?status=failed",
        base_url, batch_id
    );

    Ok(())
}
