pub mod cart;
pub mod cart_item;
pub mod product;
pub mod user;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Schema, Set,
};
use tracing::{debug, info};

use crate::entities::{
    cart::Entity as Cart, cart_item::Entity as CartItem, product::Entity as Product,
    user::Entity as User,
};
use crate::middleware::auth::AuthError;

pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    // every connection to `sqlite::memory:` opens its own database
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    Database::connect(options).await
}

/// Creates every table (and declared index) that does not exist yet. Tables are
/// created parents first so the foreign keys resolve.
pub async fn setup_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User).if_not_exists().to_owned(),
        schema.create_table_from_entity(Product).if_not_exists().to_owned(),
        schema.create_table_from_entity(Cart).if_not_exists().to_owned(),
        schema.create_table_from_entity(CartItem).if_not_exists().to_owned(),
    ];
    for table in &tables {
        db.execute(backend.build(table)).await?;
    }

    let indexes = schema
        .create_index_from_entity(Product)
        .into_iter()
        .chain(schema.create_index_from_entity(CartItem));
    for mut index in indexes {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    debug!("schema ready");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to hash admin password: {0}")]
    Hash(#[from] AuthError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Inserts an admin account unless a user with that email already exists.
pub async fn seed_admin<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<(), SeedError> {
    let existing = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!(%email, "admin account already present");
        return Ok(());
    }

    let now = Utc::now();
    let admin = user::ActiveModel {
        name: Set("Administrator".to_owned()),
        email: Set(email.to_owned()),
        password: Set(user::hash_password(password)?),
        role: Set(user::Role::Admin),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    User::insert(admin).exec(db).await?;

    info!(%email, "seeded admin account");
    Ok(())
}
