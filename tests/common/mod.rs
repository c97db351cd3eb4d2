#![allow(dead_code)]

use std::sync::Arc;

use identity_counter::{
    AutoIncrement, Collection, CounterStore, Document, Model, PluginOptions,
};
use serde_json::json;

pub fn user(name: &str, dept: &str) -> Document {
    Document::try_from(json!({ "name": name, "dept": dept })).unwrap()
}

/// Attach `options` and register the resulting binder against `collection`.
pub async fn attach_model<S, C>(
    plugin: &AutoIncrement<S>,
    collection: &Arc<C>,
    options: impl Into<PluginOptions>,
) -> Model<S, C>
where
    S: CounterStore,
    C: Collection,
{
    let binder = plugin.attach(options).unwrap();
    Model::register(binder, Arc::clone(collection)).await.unwrap()
}
