//! Seed script for development — populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` (reads .env).

use sqlx::PgPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Run migrations first
    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("=== studiopulse Seed Script ===");

    seed_projects(&pool).await?;
    seed_transactions(&pool).await?;

    println!("\n=== Seed complete! ===");

    Ok(())
}

async fn seed_projects(pool: &PgPool) -> anyhow::Result<()> {
    let projects: [(&str, &str, &str, Option<f64>); 5] = [
        ("Nova rebrand", "active", "Brand Identity", Some(18_000.0)),
        ("Atlas storefront", "active", "Web Design", Some(32_500.0)),
        ("Orbit chatbot", "active", "AI Element", Some(12_000.0)),
        ("Quarterly campaign", "completed", "Marketing", Some(9_800.0)),
        ("Prism microsite", "on_hold", "Web Design", None),
    ];

    for (name, status, project_type, revenue) in projects {
        sqlx::query(
            "INSERT INTO projects (name, status, project_type, revenue)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(status)
        .bind(project_type)
        .bind(revenue)
        .execute(pool)
        .await?;
    }

    println!("[done] Seeded {} projects", projects.len());
    Ok(())
}

async fn seed_transactions(pool: &PgPool) -> anyhow::Result<()> {
    let transactions: [(Option<f64>, &str, &str); 6] = [
        (Some(9_000.0), "deposit", "completed"),
        (Some(4_500.0), "deposit", "completed"),
        (Some(16_250.0), "milestone", "completed"),
        (Some(6_000.0), "deposit", "pending"),
        (None, "adjustment", "pending"),
        (Some(9_800.0), "final", "completed"),
    ];

    for (amount, tx_type, status) in transactions {
        sqlx::query(
            "INSERT INTO transactions (amount, tx_type, status)
             VALUES ($1, $2, $3)",
        )
        .bind(amount)
        .bind(tx_type)
        .bind(status)
        .execute(pool)
        .await?;
    }

    println!("[done] Seeded {} transactions", transactions.len());
    Ok(())
}
