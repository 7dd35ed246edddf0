//! # Seed Data Generator
//!
//! Populates the database with a sample floor plan and menu for development.
//!
//! ## Usage
//! ```bash
//! # Default floor (12 tables) into ./tavolo_dev.db
//! cargo run -p tavolo-db --bin seed
//!
//! # Custom table count and database path
//! cargo run -p tavolo-db --bin seed -- --tables 20 --db ./data/tavolo.db
//! ```
//!
//! ## Generated Data
//! - Tables `T1..Tn` with 2 to 8 seats, single tab
//! - Two shared tables (`Bar`, `Terrace Bench`) that accept several orders
//! - A menu across starters, pizzas, mains, desserts and drinks

use std::env;
use tavolo_core::{Money, ProductRequest, TableRequest};
use tavolo_db::{Database, DbConfig};

/// Menu sections: (section, [(dish, price_cents)])
const MENU: &[(&str, &[(&str, i64)])] = &[
    (
        "Starters",
        &[
            ("Bruschetta", 650),
            ("Caprese Salad", 890),
            ("Arancini", 750),
            ("Burrata", 1150),
        ],
    ),
    (
        "Pizzas",
        &[
            ("Margherita", 950),
            ("Diavola", 1150),
            ("Quattro Formaggi", 1250),
            ("Capricciosa", 1200),
        ],
    ),
    (
        "Mains",
        &[
            ("Lasagna", 1350),
            ("Carbonara", 1250),
            ("Risotto ai Funghi", 1400),
            ("Saltimbocca", 1850),
        ],
    ),
    (
        "Desserts",
        &[("Tiramisu", 650), ("Panna Cotta", 600), ("Cannoli", 550)],
    ),
    (
        "Drinks",
        &[
            ("Espresso", 250),
            ("Cappuccino", 350),
            ("Aperol Spritz", 800),
            ("Sparkling Water", 300),
            ("House Red", 600),
        ],
    ),
];

/// Shared tables that never block a second order.
const SHARED_TABLES: &[(&str, i64)] = &[("Bar", 10), ("Terrace Bench", 12)];

const USAGE: &str = "\
Usage: seed [--tables N] [--db PATH]

  -t, --tables <N>   Single-tab tables to create (default: 12)
  -d, --db <PATH>    Database file (default: ./tavolo_dev.db)
  -h, --help         Print this text";

struct SeedArgs {
    tables: usize,
    db_path: String,
}

impl SeedArgs {
    /// `Ok(None)` when help was requested.
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let mut parsed = SeedArgs {
            tables: 12,
            db_path: "./tavolo_dev.db".to_string(),
        };

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-t" | "--tables" => {
                    let value = args.next().ok_or("--tables needs a value")?;
                    parsed.tables = value
                        .parse()
                        .map_err(|_| format!("not a table count: {value}"))?;
                }
                "-d" | "--db" => {
                    parsed.db_path = args.next().ok_or("--db needs a path")?;
                }
                "-h" | "--help" => return Ok(None),
                other => return Err(format!("unknown argument: {other}")),
            }
        }

        Ok(Some(parsed))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match SeedArgs::parse(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    println!("Seeding {} ({} tables + {} shared)", args.db_path, args.tables, SHARED_TABLES.len());

    let db = Database::new(DbConfig::new(&args.db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("{existing} products already present, nothing to do.");
        println!("Remove {} to start over.", args.db_path);
        return Ok(());
    }

    for n in 1..=args.tables {
        db.tables()
            .create(&TableRequest {
                name: format!("T{n}"),
                capacity: 2 + 2 * ((n as i64 - 1) % 4),
                single_tab: Some(true),
            })
            .await?;
    }
    for (name, capacity) in SHARED_TABLES {
        db.tables()
            .create(&TableRequest {
                name: name.to_string(),
                capacity: *capacity,
                single_tab: Some(false),
            })
            .await?;
    }

    let mut products = 0;
    for (section, dishes) in MENU {
        println!("\n{section}");
        for (idx, (name, price_cents)) in dishes.iter().enumerate() {
            let product = db
                .products()
                .create(&ProductRequest {
                    name: name.to_string(),
                    price_cents: *price_cents,
                    stock: 20 + 10 * idx as i64,
                })
                .await?;
            products += 1;
            println!(
                "  {:<20} {:>7}  x{}",
                product.name,
                Money::from_cents(product.price_cents).to_string(),
                product.stock
            );
        }
    }

    let available = db.tables().list_available().await?.len();
    println!("\n{products} products, {available} tables open for orders.");

    db.close().await;
    Ok(())
}
