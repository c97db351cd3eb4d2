use std::sync::Arc;

use serde_json::{Map, Value};

use super::collection::Collection;
use super::document::Document;
use crate::binder::FieldBinder;
use crate::counter::CounterStore;
use crate::error::Result;

/// A model with auto-increment attached: documents saved through it are numbered
/// before they reach the collection.
#[derive(Debug)]
pub struct Model<S, C> {
    binder: FieldBinder<S>,
    collection: Arc<C>,
}

impl<S: CounterStore, C: Collection> Model<S, C> {
    /// Pair a binder with the collection its documents live in.
    /// Creates the unique constraint on the numbered field when the binding asks for one.
    pub async fn register(binder: FieldBinder<S>, collection: Arc<C>) -> Result<Self> {
        let config = binder.config();
        if config.unique {
            collection.ensure_unique(&config.model, &config.field).await?;
        }
        Ok(Self { binder, collection })
    }

    pub fn name(&self) -> &str {
        &self.binder.config().model
    }

    pub fn binder(&self) -> &FieldBinder<S> {
        &self.binder
    }

    /// Number the document if it is new, then write it.
    ///
    /// The counter is advanced before the write. If the write fails the document keeps
    /// its assigned value and stays new, so saving it again reuses that value.
    pub async fn save(&self, doc: &mut Document) -> Result<()> {
        let config = self.binder.config();
        if doc.is_new() {
            self.binder.before_create(doc.fields_mut(), true).await?;
            self.collection.insert(&config.model, doc.fields()).await?;
            doc.mark_saved();
        } else {
            let replaced = self
                .collection
                .replace(&config.model, &config.field, doc.fields())
                .await?;
            if replaced == 0 {
                tracing::warn!(
                    "{}: save matched no stored document by {}",
                    config.model,
                    config.field
                );
            }
        }
        Ok(())
    }

    /// Build and save a new document from its fields.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<Document> {
        let mut doc = Document::new(fields);
        self.save(&mut doc).await?;
        Ok(doc)
    }

    /// Every stored document of this model, as loaded documents.
    pub async fn find_all(&self) -> Result<Vec<Document>> {
        let docs = self.collection.find_all(self.name()).await?;
        Ok(docs.into_iter().map(Document::loaded).collect())
    }

    pub async fn next_count(&self) -> Result<i64> {
        self.binder.next_count().await
    }

    pub async fn reset_count(&self) -> Result<i64> {
        self.binder.reset_count().await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::BindingConfig;
    use crate::counter::MemoryCounterStore;
    use crate::error::Error;
    use crate::model::MemoryCollection;
    use crate::plugin::AutoIncrement;

    async fn users(config: BindingConfig) -> Model<MemoryCounterStore, MemoryCollection> {
        let plugin = AutoIncrement::with_store(MemoryCounterStore::new());
        let binder = plugin.attach_config(config).unwrap();
        Model::register(binder, Arc::new(MemoryCollection::new()))
            .await
            .unwrap()
    }

    fn new_user(name: &str) -> Document {
        Document::try_from(json!({"name": name})).unwrap()
    }

    #[tokio::test]
    async fn save_numbers_then_stores() {
        let model = users(BindingConfig::new("User")).await;
        let mut user = new_user("Charlie");
        model.save(&mut user).await.unwrap();

        assert!(!user.is_new());
        assert_eq!(user.get_i64("_id"), Some(0));
        let stored = model.find_all().await.unwrap();
        assert_eq!(stored, vec![Document::loaded(user.fields().clone())]);
    }

    #[tokio::test]
    async fn resaving_updates_without_renumbering() {
        let model = users(BindingConfig::new("User")).await;
        let mut user = new_user("Charlie");
        model.save(&mut user).await.unwrap();

        user.set("dept", "Marketing");
        model.save(&mut user).await.unwrap();

        assert_eq!(user.get_i64("_id"), Some(0));
        assert_eq!(model.next_count().await.unwrap(), 1);
        let stored = model.find_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get("dept"), Some(&json!("Marketing")));
    }

    #[tokio::test]
    async fn duplicate_manual_id_fails_save() {
        let model = users(BindingConfig::new("User")).await;
        model.create(Map::new()).await.unwrap();

        let mut clash = Document::try_from(json!({"_id": 0})).unwrap();
        let err = model.save(&mut clash).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));
        assert!(clash.is_new());
    }
}
