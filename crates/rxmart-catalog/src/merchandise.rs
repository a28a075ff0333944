//! Reference normalization, merchandise creation, effect tagging and the
//! detail view.

use std::collections::HashSet;

use rxmart_core::{canonical_value, ensure_storable, ReferenceKind, ValidationError};
use rxmart_db::{NewImage, NewMerchandise};
use serde::Deserialize;
use sqlx::PgConnection;

use crate::{
    views::{EffectAttachment, MerchandiseDetail, ReferenceIntent},
    CatalogError, CatalogService, ImageStore, ImageUpload, Outcome,
};

/// Text fields of a merchandise creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMerchandiseInput {
    pub name: String,
    pub manufacturer: String,
    pub usage_instruction: String,
    /// Effect tag names to attach once the merchandise exists.
    #[serde(default)]
    pub effects: Vec<String>,
}

impl NewMerchandiseInput {
    /// Trimmed `(name, manufacturer, usage_instruction)`.
    fn canonical(&self) -> Result<(String, String, String), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        ensure_storable("name", name)?;
        let manufacturer = canonical_value(ReferenceKind::Manufacturer, &self.manufacturer)?;
        let usage = canonical_value(ReferenceKind::UsageInstruction, &self.usage_instruction)?;
        Ok((name.to_string(), manufacturer, usage))
    }
}

/// Trimmed, non-blank effect names in first-seen order without repeats.
fn distinct_effect_names(names: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::with_capacity(names.len());
    for name in names.iter().filter(|name| !name.trim().is_empty()) {
        let name = canonical_value(ReferenceKind::Effect, name)?;
        if seen.insert(name.clone()) {
            distinct.push(name);
        }
    }
    Ok(distinct)
}

async fn attach_named_effects(
    conn: &mut PgConnection,
    merchandise_id: i64,
    names: Vec<String>,
) -> Result<Vec<EffectAttachment>, CatalogError> {
    let mut attachments = Vec::with_capacity(names.len());
    for name in names {
        let effect = rxmart_db::connect_or_create(&mut *conn, ReferenceKind::Effect, &name).await?;
        let attached = rxmart_db::attach_effect(&mut *conn, merchandise_id, effect.id)
            .await
            .map_err(|e| CatalogError::missing_parent(e, "merchandise", merchandise_id))?;
        attachments.push(EffectAttachment {
            effect_id: effect.id,
            name,
            attached,
        });
    }
    Ok(attachments)
}

impl<S: ImageStore> CatalogService<S> {
    /// Classifies `raw` as an existing reference row to connect to, or a value
    /// the next write must create. Never writes.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for a blank value, or
    /// [`CatalogError::Db`] if the lookup fails.
    pub async fn normalize(
        &self,
        kind: ReferenceKind,
        raw: &str,
    ) -> Result<Outcome<ReferenceIntent>, CatalogError> {
        let value = canonical_value(kind, raw)?;
        let normalized = rxmart_db::normalize(&self.pool, kind, &value).await?;
        let intent = ReferenceIntent::from(normalized);

        let message = match &intent {
            ReferenceIntent::Connect { id } => format!("{kind} '{value}' exists as {id}"),
            ReferenceIntent::Create { .. } => format!("{kind} '{value}' will be created"),
        };
        Ok(Outcome::new(intent, message))
    }

    /// Creates a merchandise record.
    ///
    /// Every field is validated before anything is written. The image is
    /// uploaded first; usage instruction and manufacturer are then connected
    /// or created, and the image row, merchandise row and effect tags are
    /// written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for blank fields,
    /// [`CatalogError::Image`] if the upload is rejected or cannot be stored,
    /// or [`CatalogError::Db`] if any write fails. A failure after the
    /// upload leaves the blob in the image store.
    pub async fn create_merchandise(
        &self,
        input: NewMerchandiseInput,
        image: ImageUpload,
    ) -> Result<Outcome<MerchandiseDetail>, CatalogError> {
        let (name, manufacturer, usage) = input.canonical()?;
        let effects = distinct_effect_names(&input.effects)?;

        let stored = self.images.upload(&image).await?;

        let mut tx = self.pool.begin().await?;

        let usage_ref =
            rxmart_db::connect_or_create(&mut tx, ReferenceKind::UsageInstruction, &usage).await?;
        let manufacturer_ref =
            rxmart_db::connect_or_create(&mut tx, ReferenceKind::Manufacturer, &manufacturer)
                .await?;

        let image_row = rxmart_db::insert_image(
            &mut tx,
            &NewImage {
                storage_key: &stored.key,
                url: &stored.url,
                content_type: stored.content_type.as_deref(),
                byte_size: i64::try_from(stored.byte_size).unwrap_or(i64::MAX),
            },
        )
        .await?;

        let row = rxmart_db::insert_merchandise(
            &mut tx,
            &NewMerchandise {
                name: &name,
                manufacturer_id: manufacturer_ref.id,
                usage_instruction_id: usage_ref.id,
                image_id: image_row.id,
            },
        )
        .await?;

        let attachments = attach_named_effects(&mut tx, row.id, effects).await?;
        tx.commit().await?;

        tracing::info!(
            merchandise_id = row.id,
            manufacturer_id = manufacturer_ref.id,
            manufacturer_created = manufacturer_ref.created,
            usage_instruction_id = usage_ref.id,
            usage_instruction_created = usage_ref.created,
            image_key = %stored.key,
            effects = attachments.len(),
            "created merchandise"
        );

        let detail = self.load_detail(row.id).await?;
        Ok(Outcome::new(
            detail,
            format!("merchandise '{name}' created"),
        ))
    }

    /// Tags a merchandise with each named effect, creating effect rows as
    /// needed. Blank names are dropped, repeats collapse, and an effect that
    /// is already attached is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if a name contains `\0`,
    /// [`CatalogError::NotFound`] if the merchandise does not exist, or
    /// [`CatalogError::Db`] if a write fails; no tag is written on failure.
    pub async fn attach_effects(
        &self,
        merchandise_id: i64,
        names: &[String],
    ) -> Result<Outcome<Vec<EffectAttachment>>, CatalogError> {
        let names = distinct_effect_names(names)?;
        if !rxmart_db::merchandise_exists(&self.pool, merchandise_id).await? {
            return Err(CatalogError::NotFound {
                entity: "merchandise",
                id: merchandise_id,
            });
        }

        let mut tx = self.pool.begin().await?;
        let attachments = attach_named_effects(&mut tx, merchandise_id, names).await?;
        tx.commit().await?;

        let newly_attached = attachments.iter().filter(|a| a.attached).count();
        tracing::info!(merchandise_id, newly_attached, "attached effects");

        Ok(Outcome::new(
            attachments,
            format!("{newly_attached} effect(s) attached to merchandise {merchandise_id}"),
        ))
    }

    /// The merchandise with its reference names, effects, like count and
    /// comments (newest first).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id, or
    /// [`CatalogError::Db`] if a query fails.
    pub async fn get_merchandise(
        &self,
        merchandise_id: i64,
    ) -> Result<Outcome<MerchandiseDetail>, CatalogError> {
        let detail = self.load_detail(merchandise_id).await?;
        let message = format!("merchandise {merchandise_id}");
        Ok(Outcome::new(detail, message))
    }

    async fn load_detail(&self, merchandise_id: i64) -> Result<MerchandiseDetail, CatalogError> {
        let row = rxmart_db::get_merchandise_detail(&self.pool, merchandise_id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: "merchandise",
                id: merchandise_id,
            })?;
        let comments = rxmart_db::list_comments(&self.pool, merchandise_id).await?;
        Ok(MerchandiseDetail::from_parts(row, comments))
    }
}
