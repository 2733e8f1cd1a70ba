//! # Sample Menu Seeder
//!
//! Populates the configured store with a small restaurant menu for
//! development. The store mode comes from store.toml and the environment,
//! exactly as the app would open it; `--data-dir` only moves the files.
//!
//! ## Usage
//! ```bash
//! # Seed the store described by the default store.toml
//! cargo run -p dinedesk-store --bin seed
//!
//! # Seed a specific directory, keeping the configured mode
//! cargo run -p dinedesk-store --bin seed -- --data-dir ./data
//!
//! # Use another config file
//! cargo run -p dinedesk-store --bin seed -- --config ./store.toml
//! ```
//!
//! ## Generated Data
//! - Categories: 主食, 小吃, 饮品
//! - Dishes with portion, spice and cup-size options
//! - Restaurant info and a disabled announcement

use dinedesk_core::{Announcement, MenuItem, MenuOption, OptionGroup, RestaurantInfo};
use dinedesk_store::{Storage, StoreConfig, StoreMode};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (category, dish, description, base price in cents)
const DISHES: &[(&str, &str, &str, i64)] = &[
    ("主食", "黄焖鸡米饭", "鸡腿肉、土豆、香菇，配米饭", 1950),
    ("主食", "红烧牛肉面", "手工拉面，大块牛腱", 1800),
    ("主食", "扬州炒饭", "虾仁、火腿、鸡蛋", 1500),
    ("小吃", "煎饺", "猪肉白菜馅，外酥里嫩", 1500),
    ("小吃", "凉拌黄瓜", "蒜香爽口", 1200),
    ("饮品", "酸梅汤", "自制冰镇酸梅汤", 450),
    ("饮品", "珍珠奶茶", "现煮茶底", 550),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let argv: Vec<String> = env::args().skip(1).collect();
    let args = SeedArgs::parse(&argv);
    if args.help {
        println!("Dinedesk Sample Menu Seeder");
        println!();
        println!("Usage: seed [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -c, --config <PATH>    Store config file (default: platform store.toml)");
        println!("  -d, --data-dir <PATH>  Store directory (default: from store.toml)");
        println!("  -h, --help             Show this help message");
        return Ok(());
    }

    let config = args.apply(StoreConfig::load_or_default(args.config.clone()));

    println!("🌱 Dinedesk Sample Menu Seeder");
    println!("=============================");
    println!("Mode:     {}", config.mode);
    println!("Data dir: {}", config.data_dir.display());
    println!();

    if config.mode == StoreMode::Remote {
        warn!("Remote mode keeps documents in memory; the seed will not outlive this process");
        println!("⚠ Remote mode is in-memory only, nothing will be kept after exit.");
    }

    let storage = Storage::open(config)?;
    let menu = storage.menu();

    let existing = menu.list_items()?.len();
    if existing > 0 {
        println!("⚠ Store already has {} menu items", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut category_ids = Vec::new();
    for name in ["主食", "小吃", "饮品"] {
        let category = menu.add_category(name)?;
        category_ids.push((name, category.id));
    }
    println!("✓ Created {} categories", category_ids.len());

    let mut created = 0;
    for &(category_name, name, description, price_cents) in DISHES {
        let category = category_ids
            .iter()
            .find(|(n, _)| *n == category_name)
            .map(|(_, id)| id.clone())
            .unwrap_or_default();

        let item = MenuItem {
            id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
            price_cents,
            image_url: String::new(),
            category,
            available: true,
            custom_options: options_for(category_name, name),
        };

        if let Err(e) = menu.create_item(item) {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        created += 1;
    }
    println!("✓ Created {} menu items", created);

    let settings = storage.settings();
    settings.set_restaurant_info(&RestaurantInfo {
        name: "老王家常菜".to_string(),
        address: "Hauptstraße 12, Berlin".to_string(),
        phone: "+49 30 1234567".to_string(),
        opening_hours: "11:00-14:00, 17:00-21:30".to_string(),
    })?;
    settings.set_announcement(&Announcement {
        title: "欢迎".to_string(),
        content: "群接龙下单，到店报取餐码取餐".to_string(),
        enabled: false,
    })?;
    println!("✓ Saved restaurant info");

    info!(items = created, "Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Default, PartialEq)]
struct SeedArgs {
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    help: bool,
}

impl SeedArgs {
    /// Parses arguments after the program name. Unknown flags are ignored.
    fn parse(args: &[String]) -> Self {
        let mut parsed = SeedArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config = iter.next().map(PathBuf::from),
                "--data-dir" | "-d" => parsed.data_dir = iter.next().map(PathBuf::from),
                "--help" | "-h" => parsed.help = true,
                _ => {}
            }
        }
        parsed
    }

    /// Overrides the loaded config. The mode is never changed.
    fn apply(&self, mut config: StoreConfig) -> StoreConfig {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }
}

// =============================================================================
// Sample Data
// =============================================================================

fn option(id: &str, name: &str, price_cents: Option<i64>, is_default: bool) -> MenuOption {
    MenuOption {
        id: id.to_string(),
        name: name.to_string(),
        price_cents,
        is_default,
    }
}

/// Option groups for a seeded dish.
fn options_for(category: &str, name: &str) -> Vec<OptionGroup> {
    match (category, name) {
        ("主食", "黄焖鸡米饭") => vec![
            OptionGroup {
                kind: "radio".to_string(),
                title: "份量".to_string(),
                required: true,
                options: vec![
                    option("regular", "标准", None, true),
                    option("large", "大份", Some(600), false),
                ],
            },
            OptionGroup {
                kind: "radio".to_string(),
                title: "辣度".to_string(),
                required: false,
                options: vec![
                    option("none", "不辣", None, true),
                    option("mild", "微辣", None, false),
                    option("hot", "中辣", None, false),
                ],
            },
        ],
        ("小吃", "煎饺") => vec![OptionGroup {
            kind: "radio".to_string(),
            title: "份量".to_string(),
            required: true,
            options: vec![
                option("small", "小份(8个)", Some(1500), true),
                option("large", "大份(12个)", Some(2100), false),
            ],
        }],
        ("饮品", _) => vec![OptionGroup {
            kind: "radio".to_string(),
            title: "杯型".to_string(),
            required: true,
            options: vec![
                option("medium", "中杯", None, true),
                option("large", "大杯", Some(100), false),
            ],
        }],
        ("主食", _) => vec![OptionGroup {
            kind: "checkbox".to_string(),
            title: "加料".to_string(),
            required: false,
            options: vec![
                option("egg", "加蛋", Some(150), false),
                option("veg", "加青菜", Some(100), false),
            ],
        }],
        _ => Vec::new(),
    }
}
