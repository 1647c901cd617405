//! Product service: catalog CRUD and image handling

use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::error::AppError;
use crate::images::ImageStore;
use crate::store::{Page, Store};
use std::sync::Arc;
use uuid::Uuid;

pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct ProductService {
    store: Arc<dyn Store>,
    images: Arc<dyn ImageStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        Self { store, images }
    }

    fn check_new(new: &NewProduct) -> Result<(), AppError> {
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("product name is required".into()));
        }
        if new.price < 0 {
            return Err(AppError::Validation("price must not be negative".into()));
        }
        if new.stock < 0 {
            return Err(AppError::Validation("stock must not be negative".into()));
        }
        if new.cost_price.is_some_and(|c| c < 0) || new.override_price.is_some_and(|c| c < 0) {
            return Err(AppError::Validation("prices must not be negative".into()));
        }
        Ok(())
    }

    /// Uploads any attached images first so the stored record carries their
    /// public URLs from the start.
    pub async fn create(&self, mut new: NewProduct, images: Vec<UploadedImage>) -> Result<Product, AppError> {
        Self::check_new(&new)?;
        for image in images {
            let url = self.images.store(&image.filename, &image.bytes).await?;
            new.image_urls.push(url);
        }
        self.store.insert_product(new).await
    }

    pub async fn update(&self, id: Uuid, mut patch: ProductPatch, images: Vec<UploadedImage>) -> Result<Product, AppError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("product name must not be empty".into()));
        }
        if patch.price.is_some_and(|p| p < 0) || patch.stock.is_some_and(|s| s < 0) {
            return Err(AppError::Validation("price and stock must not be negative".into()));
        }
        for image in images {
            let url = self.images.store(&image.filename, &image.bytes).await?;
            patch.add_image_urls.push(url);
        }
        self.store
            .update_product(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("producto {id}")))
    }

    /// Deletes the record and purges its stored images. A purge failure is
    /// logged; the deletion stands.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let product = self
            .store
            .delete_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("producto {id}")))?;
        if let Err(e) = self.images.purge(&product.image_urls).await {
            tracing::warn!(error = %e, product = %id, "failed to purge product images");
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("producto {id}")))
    }

    pub async fn by_sku(&self, sku: &str) -> Result<Product, AppError> {
        let sku = crate::domain::product::Sku::new(sku)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.store
            .product_by_sku(sku.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("producto {sku}")))
    }

    pub async fn list(&self, page: Page) -> Result<(Vec<Product>, i64), AppError> {
        self.store.products(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Image store double that remembers what it stored and purged.
    #[derive(Default)]
    struct RecordingImages {
        stored: Mutex<Vec<String>>,
        purged: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageStore for RecordingImages {
        async fn store(&self, filename: &str, _bytes: &[u8]) -> Result<String, AppError> {
            let url = format!("http://media.test/media/{filename}");
            self.stored.lock().unwrap().push(url.clone());
            Ok(url)
        }

        async fn purge(&self, urls: &[String]) -> Result<(), AppError> {
            self.purged.lock().unwrap().extend(urls.iter().cloned());
            Ok(())
        }
    }

    fn service() -> (ProductService, Arc<RecordingImages>) {
        let images = Arc::new(RecordingImages::default());
        (ProductService::new(Arc::new(MemStore::new()), images.clone()), images)
    }

    #[tokio::test]
    async fn create_with_image_stores_public_url() {
        let (service, images) = service();
        let product = service
            .create(
                NewProduct { name: "Yerba".into(), price: 1_500, ..Default::default() },
                vec![UploadedImage { filename: "yerba.png".into(), bytes: vec![1, 2, 3] }],
            )
            .await
            .unwrap();
        assert_eq!(product.image_urls, vec!["http://media.test/media/yerba.png"]);
        assert_eq!(images.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_purges_images() {
        let (service, images) = service();
        let product = service
            .create(
                NewProduct { name: "Yerba".into(), price: 1_500, ..Default::default() },
                vec![UploadedImage { filename: "a.png".into(), bytes: vec![] }],
            )
            .await
            .unwrap();

        service.delete(product.id).await.unwrap();
        assert_eq!(*images.purged.lock().unwrap(), product.image_urls);
        assert!(matches!(service.get(product.id).await.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn partial_update_merges_and_sku_lookup_normalizes() {
        let (service, _images) = service();
        let product = service
            .create(
                NewProduct {
                    name: "Yerba".into(),
                    price: 1_500,
                    sku: Some(crate::domain::product::Sku::new("yer-001").unwrap()),
                    ..Default::default()
                },
                vec![],
            )
            .await
            .unwrap();

        let updated = service
            .update(product.id, ProductPatch { price: Some(1_800), ..Default::default() }, vec![])
            .await
            .unwrap();
        assert_eq!(updated.price, 1_800);
        assert_eq!(updated.name, "Yerba");

        let found = service.by_sku("  yer-001 ").await.unwrap();
        assert_eq!(found.id, product.id);
    }

    #[tokio::test]
    async fn rejects_invalid_records() {
        let (service, _images) = service();
        let err = service
            .create(NewProduct { name: "  ".into(), price: 100, ..Default::default() }, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create(NewProduct { name: "Yerba".into(), price: -1, ..Default::default() }, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
