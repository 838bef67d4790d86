//! MongoDB Index Initialization
//!
//! Creates the indexes the repositories rely on for uniqueness.

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_principal_indexes(db).await?;
    create_store_indexes(db).await?;
    create_revoked_token_indexes(db).await?;
    create_audit_log_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

fn unique() -> IndexOptions {
    IndexOptions::builder().unique(true).build()
}

async fn create_principal_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>("principals");

    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "normalizedEmail": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "normalizedUserName": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    Ok(())
}

async fn create_store_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>("stores");

    // One address and one manager per store
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "addressId": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "managerId": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    Ok(())
}

async fn create_revoked_token_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // The token itself is the _id, so only pruning needs an index
    let collection = db.collection::<mongodb::bson::Document>("revoked_tokens");

    collection
        .create_index(IndexModel::builder().keys(doc! { "expiresAt": 1 }).build())
        .await?;

    Ok(())
}

async fn create_audit_log_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>("audit_logs");

    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "entityType": 1, "entityId": 1 })
                .build(),
        )
        .await?;

    collection
        .create_index(IndexModel::builder().keys(doc! { "performedAt": -1 }).build())
        .await?;

    Ok(())
}
