use rxmart_core::SearchKeyword;

use crate::{
    views::{MerchandiseSummary, SearchHit},
    CatalogError, CatalogService, ImageStore, Outcome,
};

impl<S: ImageStore> CatalogService<S> {
    /// Merchandise whose name, manufacturer name, or any effect name contains
    /// the keyword. Matching is case-sensitive and each merchandise appears
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for a blank keyword, or
    /// [`CatalogError::Db`] if the query fails.
    pub async fn search(&self, raw_keyword: &str) -> Result<Outcome<Vec<SearchHit>>, CatalogError> {
        let keyword = SearchKeyword::parse(raw_keyword)?;
        let rows = rxmart_db::search_merchandise(&self.pool, keyword.as_str()).await?;

        let message = format!("{} merchandise match '{keyword}'", rows.len());
        Ok(Outcome::new(
            rows.into_iter().map(SearchHit::from).collect(),
            message,
        ))
    }

    /// Category-scoped variant of [`Self::search`]: the same filter, returning
    /// bare merchandise records ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for a blank keyword, or
    /// [`CatalogError::Db`] if the query fails.
    pub async fn search_by_category(
        &self,
        raw_keyword: &str,
    ) -> Result<Outcome<Vec<MerchandiseSummary>>, CatalogError> {
        let keyword = SearchKeyword::parse(raw_keyword)?;
        let rows = rxmart_db::search_merchandise_rows(&self.pool, keyword.as_str()).await?;

        let message = format!("{} merchandise in category '{keyword}'", rows.len());
        Ok(Outcome::new(
            rows.into_iter().map(MerchandiseSummary::from).collect(),
            message,
        ))
    }
}
