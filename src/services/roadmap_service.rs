use crate::{
    database::{MongoDB, ROADMAP_CATEGORIES, ROADMAP_ITEMS},
    models::{
        ActivityType, CreateRoadmapItemRequest, RoadmapCategory, RoadmapCategoryDocument,
        RoadmapItem, RoadmapItemDocument, UpdateRoadmapItemRequest,
    },
    utils::{AppError, AppResult},
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use std::collections::HashMap;

use super::activity_service;

fn not_found() -> AppError {
    AppError::NotFound("Roadmap item not found".to_string())
}

/// Nests items under their categories. Items naming a category without a
/// stored document get a category of their own with an empty description.
pub fn group_into_categories(
    categories: Vec<RoadmapCategoryDocument>,
    items: Vec<RoadmapItemDocument>,
) -> Vec<RoadmapCategory> {
    let mut ordered: Vec<(i32, RoadmapCategory)> = categories
        .into_iter()
        .map(|c| {
            (
                c.order,
                RoadmapCategory {
                    id: c.id.to_hex(),
                    name: c.name,
                    description: c.description,
                    items: Vec::new(),
                },
            )
        })
        .collect();

    let mut index: HashMap<String, usize> = ordered
        .iter()
        .enumerate()
        .map(|(i, (_, c))| (c.name.clone(), i))
        .collect();

    for item in items {
        let slot = match index.get(&item.category) {
            Some(&slot) => slot,
            None => {
                ordered.push((
                    i32::MAX,
                    RoadmapCategory {
                        id: item.category.to_lowercase().replace(' ', "-"),
                        name: item.category.clone(),
                        description: String::new(),
                        items: Vec::new(),
                    },
                ));
                index.insert(item.category.clone(), ordered.len() - 1);
                ordered.len() - 1
            }
        };
        ordered[slot].1.items.push(RoadmapItem::from(item));
    }

    ordered.sort_by(|(a_order, a), (b_order, b)| a_order.cmp(b_order).then_with(|| a.name.cmp(&b.name)));

    ordered
        .into_iter()
        .map(|(_, mut category)| {
            category
                .items
                .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.title.cmp(&b.title)));
            category
        })
        .collect()
}

/// `$set` document for a partial item update.
pub fn build_update_document(patch: &UpdateRoadmapItemRequest) -> AppResult<Document> {
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let mut set = Document::new();
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title: Title cannot be empty".to_string()));
        }
        set.insert("title", title.trim());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(completed) = patch.completed {
        set.insert("completed", completed);
    }
    if let Some(order) = patch.order {
        set.insert("order", order);
    }
    if let Some(category) = &patch.category {
        if category.trim().is_empty() {
            return Err(AppError::Validation("category: Category cannot be empty".to_string()));
        }
        set.insert("category", category.trim());
    }
    set.insert("updated_at", BsonDateTime::now());

    Ok(doc! { "$set": set })
}

pub async fn get_roadmap(db: &MongoDB, user_id: &str) -> AppResult<Vec<RoadmapCategory>> {
    let categories: Vec<RoadmapCategoryDocument> = db
        .collection::<RoadmapCategoryDocument>(ROADMAP_CATEGORIES)
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect()
        .await?;

    let items: Vec<RoadmapItemDocument> = db
        .collection::<RoadmapItemDocument>(ROADMAP_ITEMS)
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect()
        .await?;

    Ok(group_into_categories(categories, items))
}

async fn ensure_category(
    db: &MongoDB,
    user_id: &str,
    name: &str,
    description: Option<&str>,
) -> AppResult<()> {
    let collection = db.collection::<RoadmapCategoryDocument>(ROADMAP_CATEGORIES);
    let existing = collection.count_documents(doc! { "user_id": user_id }).await?;

    collection
        .update_one(
            doc! { "user_id": user_id, "name": name },
            doc! { "$setOnInsert": {
                "_id": ObjectId::new(),
                "description": description.unwrap_or_default(),
                "order": existing as i32,
            } },
        )
        .upsert(true)
        .await?;
    Ok(())
}

pub async fn create_item(
    db: &MongoDB,
    user_id: &str,
    request: &CreateRoadmapItemRequest,
) -> AppResult<RoadmapItem> {
    let title = request.title.trim();
    let category = request.category.trim();
    if title.is_empty() || category.is_empty() {
        return Err(AppError::Validation(
            "title and category are required".to_string(),
        ));
    }

    ensure_category(db, user_id, category, request.category_description.as_deref()).await?;

    let items = db.collection::<RoadmapItemDocument>(ROADMAP_ITEMS);
    let order = match request.order {
        Some(order) => order,
        None => items
            .count_documents(doc! { "user_id": user_id, "category": category })
            .await? as i32,
    };

    let now = BsonDateTime::now();
    let item = RoadmapItemDocument {
        id: ObjectId::new(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        description: request.description.clone(),
        completed: false,
        order,
        category: category.to_string(),
        created_at: now,
        updated_at: now,
    };
    items.insert_one(&item).await?;

    log::info!("🗺️  Roadmap item created for user {}: {}", user_id, item.title);
    Ok(RoadmapItem::from(item))
}

/// The item as it reads once `patch` is applied. Mirrors what
/// [`build_update_document`] writes.
pub fn apply_patch(item: &RoadmapItemDocument, patch: &UpdateRoadmapItemRequest) -> RoadmapItemDocument {
    let mut after = item.clone();
    if let Some(title) = &patch.title {
        after.title = title.trim().to_string();
    }
    if let Some(description) = &patch.description {
        after.description = description.clone();
    }
    if let Some(completed) = patch.completed {
        after.completed = completed;
    }
    if let Some(order) = patch.order {
        after.order = order;
    }
    if let Some(category) = &patch.category {
        after.category = category.trim().to_string();
    }
    after
}

/// Only a false to true transition counts as completing an item.
pub fn newly_completed(before: &RoadmapItemDocument, after: &RoadmapItemDocument) -> bool {
    !before.completed && after.completed
}

pub async fn update_item(
    db: &MongoDB,
    user_id: &str,
    item_id: &str,
    patch: &UpdateRoadmapItemRequest,
) -> AppResult<RoadmapItem> {
    let update = build_update_document(patch)?;
    let id = ObjectId::parse_str(item_id).map_err(|_| not_found())?;
    let filter = doc! { "_id": id, "user_id": user_id };

    let before = db
        .collection::<RoadmapItemDocument>(ROADMAP_ITEMS)
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::Before)
        .await?
        .ok_or_else(not_found)?;
    let after = apply_patch(&before, patch);

    if patch.category.is_some() {
        ensure_category(db, user_id, &after.category, None).await?;
    }

    // The item is already written; a lost activity must not turn that into an error.
    if newly_completed(&before, &after) {
        if let Err(e) = activity_service::record(
            db,
            user_id,
            ActivityType::Completion,
            format!("Completed: {}", after.title),
            Some(after.category.clone()),
        )
        .await
        {
            log::error!("❌ Failed to record completion of item {}: {}", item_id, e);
        }
    }

    Ok(RoadmapItem::from(after))
}
