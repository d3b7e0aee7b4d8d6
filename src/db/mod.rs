use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;

use crate::config::Config;
use crate::domain::community::default_communities;
use crate::ports::{CommunityRepository, RepositoryResult};

pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let url = config.require_database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Upserts the default communities. Returns how many were written.
pub async fn seed_communities(store: &dyn CommunityRepository) -> RepositoryResult<usize> {
    let seeds = default_communities();
    for community in &seeds {
        let stored = store.upsert_community(community).await?;
        tracing::info!(community_id = %stored.id, name = %stored.name, "community seeded");
    }
    Ok(seeds.len())
}
