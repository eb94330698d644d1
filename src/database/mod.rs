use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

pub const USERS: &str = "users";
pub const ROADMAP_ITEMS: &str = "roadmap_items";
pub const ROADMAP_CATEGORIES: &str = "roadmap_categories";
pub const ACTIVITIES: &str = "activities";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> mongodb::error::Result<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.app_name = Some("prepwise-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| "prepwise".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        db.run_command(doc! { "ping": 1 }).await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the services query by.
    async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();
        let sparse_unique = IndexOptions::builder().unique(true).sparse(true).build();

        self.create_index(USERS, doc! { "email": 1 }, Some(unique.clone())).await?;
        self.create_index(USERS, doc! { "google_id": 1 }, Some(sparse_unique)).await?;
        self.create_index(ROADMAP_ITEMS, doc! { "user_id": 1, "order": 1 }, None).await?;
        self.create_index(ROADMAP_CATEGORIES, doc! { "user_id": 1, "name": 1 }, Some(unique))
            .await?;
        self.create_index(ACTIVITIES, doc! { "user_id": 1, "timestamp": -1 }, None).await?;

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<IndexOptions>,
    ) -> mongodb::error::Result<()> {
        let label = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
        let model = IndexModel::builder().keys(keys).options(options).build();

        match self.collection::<Document>(collection).create_index(model).await {
            Ok(_) => log::info!("   ✅ Index created: {}", label),
            Err(e) => log::debug!("   ℹ️  Index already exists: {} ({})", label, e),
        }
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
