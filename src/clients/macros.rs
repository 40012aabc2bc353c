/// Generates the lookup methods every resource client shares:
/// `get_<name>` (missing is `None`) and `require_<name>` (missing is `NotFound`).
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<Option<$entity>, $error> {
                    tracing::debug!("Sending request");
                    Ok(self.inner.get(id).await?)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<require_ $entity_name_snake>](&self, id: String) -> Result<$entity, $error> {
                    tracing::debug!("Sending request");
                    match self.inner.get(id.clone()).await? {
                        Some(found) => Ok(found),
                        None => Err(<$error>::NotFound(id)),
                    }
                }
            }
        }
    };
}
