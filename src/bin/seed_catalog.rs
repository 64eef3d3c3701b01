//! Create the database schema and load the starter food catalog

use nutriscale::config::Config;
use nutriscale::db::Database;
use nutriscale::models::CatalogFood;
use nutriscale::nutrition::default_catalog;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    println!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::open(&config.database_path)?;

    database.with_conn(|conn| {
        let inserted = CatalogFood::seed(conn, &default_catalog())?;
        let total = CatalogFood::count(conn)?;
        println!("Catalog seeded:");
        println!("  Inserted: {}", inserted);
        println!("  Total foods: {}", total);
        Ok(())
    })?;

    Ok(())
}
