use crate::{views::LikeView, CatalogError, CatalogService, ImageStore, Outcome};

impl<S: ImageStore> CatalogService<S> {
    /// Likes the merchandise if the customer has not yet, otherwise removes
    /// the like. Two calls in a row restore the original state.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the merchandise does not exist,
    /// or [`CatalogError::Db`] if the store fails or concurrent toggles on the
    /// same pair never settle.
    pub async fn toggle_like(
        &self,
        merchandise_id: i64,
        customer_id: i64,
    ) -> Result<Outcome<LikeView>, CatalogError> {
        let toggle = rxmart_db::toggle_like(&self.pool, customer_id, merchandise_id)
            .await
            .map_err(|e| CatalogError::missing_parent(e, "merchandise", merchandise_id))?;

        tracing::info!(customer_id, merchandise_id, liked = toggle.liked, "toggled like");

        let message = if toggle.liked {
            "merchandise liked"
        } else {
            "like removed"
        };
        Ok(Outcome::new(
            LikeView {
                customer_id: toggle.like.customer_id,
                merchandise_id: toggle.like.merchandise_id,
                liked: toggle.liked,
            },
            message,
        ))
    }
}
