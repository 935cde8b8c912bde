/// Database connection and schema creation
pub mod database;

/// Seed accounts loaded from canteen.toml
pub mod seed;

/// Bind address and encryption key from environment variables
pub mod server;
