//! "Most liked" rankings filtered by customer age, customer gender, or
//! effect tag.

use rxmart_core::{AgeBand, Gender, RankingFilter};

use crate::{views::RankedMerchandise, CatalogError, CatalogService, ImageStore, Outcome};

impl<S: ImageStore> CatalogService<S> {
    /// Merchandise sorted by qualifying like count, highest first, ties by
    /// ascending id. Merchandise without a qualifying like is omitted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Db`] if the query fails.
    pub async fn rank(
        &self,
        filter: RankingFilter,
        limit: Option<i64>,
    ) -> Result<Outcome<Vec<RankedMerchandise>>, CatalogError> {
        let rows = match filter {
            RankingFilter::Age(band) => rxmart_db::rank_by_age(&self.pool, band, limit).await?,
            RankingFilter::Gender(gender) => {
                rxmart_db::rank_by_gender(&self.pool, gender, limit).await?
            }
            RankingFilter::Effect(effect_id) => {
                rxmart_db::rank_by_effect(&self.pool, effect_id, limit).await?
            }
        };

        tracing::debug!(?filter, count = rows.len(), "computed ranking");

        Ok(Outcome::new(
            rows.into_iter().map(RankedMerchandise::from).collect(),
            filter.describe(),
        ))
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for a negative or inverted band,
    /// or [`CatalogError::Db`] if the query fails.
    pub async fn rank_by_age(
        &self,
        min_age: i32,
        max_age: i32,
        limit: Option<i64>,
    ) -> Result<Outcome<Vec<RankedMerchandise>>, CatalogError> {
        let band = AgeBand::new(min_age, max_age)?;
        self.rank(RankingFilter::Age(band), limit).await
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Db`] if the query fails.
    pub async fn rank_by_gender(
        &self,
        gender: Gender,
        limit: Option<i64>,
    ) -> Result<Outcome<Vec<RankedMerchandise>>, CatalogError> {
        self.rank(RankingFilter::Gender(gender), limit).await
    }

    /// Counts every like row on merchandise carrying `effect_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Db`] if the query fails.
    pub async fn rank_by_effect(
        &self,
        effect_id: i64,
        limit: Option<i64>,
    ) -> Result<Outcome<Vec<RankedMerchandise>>, CatalogError> {
        self.rank(RankingFilter::Effect(effect_id), limit).await
    }
}
