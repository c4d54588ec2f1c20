use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{DomainError, DomainResult};
use crate::geometry::GeometryEngine;
use crate::layer::{CreateLayerInput, Feature, InsertFeatureInput, Layer};
use crate::repository::{FeatureRepository, LayerRepository};

/// Domain service for the feature store: layer management, feature insertion
/// and the spatial queries (intersects, total geodesic area).
///
/// Spatial predicates are delegated to the `GeometryEngine`; the service only
/// orchestrates layer resolution, geometry validation and aggregation.
pub struct FeatureService {
    layers: Arc<dyn LayerRepository>,
    features: Arc<dyn FeatureRepository>,
    geometry: Arc<dyn GeometryEngine>,
}

impl FeatureService {
    pub fn new(
        layers: Arc<dyn LayerRepository>,
        features: Arc<dyn FeatureRepository>,
        geometry: Arc<dyn GeometryEngine>,
    ) -> Self {
        Self {
            layers,
            features,
            geometry,
        }
    }

    pub async fn create_layer(&self, input: CreateLayerInput) -> DomainResult<Layer> {
        let layer = self.layers.create_layer(input).await?;
        info!(layer = %layer.name, layer_id = layer.id, "created layer");
        Ok(layer)
    }

    pub async fn list_layers(&self) -> DomainResult<Vec<Layer>> {
        self.layers.list_layers().await
    }

    /// Insert a feature into the named layer. Fails with `LayerNotFound` when
    /// the layer does not exist and `InvalidGeometry` when the WKT does not
    /// parse; nothing is persisted in either case.
    pub async fn insert_feature(
        &self,
        layer_name: &str,
        properties: crate::types::PropertyMap,
        geom_wkt: String,
    ) -> DomainResult<Feature> {
        let layer = self.resolve_layer(layer_name).await?;
        self.geometry.validate(&geom_wkt)?;

        let feature = self
            .features
            .insert_feature(InsertFeatureInput {
                layer_id: layer.id,
                properties,
                geom_wkt,
            })
            .await?;

        debug!(
            layer = %layer_name,
            feature_id = feature.id,
            "inserted feature"
        );
        Ok(feature)
    }

    /// Features of the named layer, newest-first.
    pub async fn list_features(
        &self,
        layer_name: &str,
        limit: Option<i64>,
    ) -> DomainResult<Vec<Feature>> {
        let layer = self.resolve_layer(layer_name).await?;
        self.features.list_features(layer.id, limit).await
    }

    /// Features of the named layer whose geometry intersects the query
    /// geometry, per the geometry engine's predicate.
    pub async fn intersects(
        &self,
        layer_name: &str,
        geom_wkt: &str,
    ) -> DomainResult<Vec<Feature>> {
        let layer = self.resolve_layer(layer_name).await?;
        self.geometry.validate(geom_wkt)?;

        let candidates = self.features.list_features(layer.id, None).await?;
        let mut matched = Vec::new();
        for feature in candidates {
            if self.geometry.intersects(&feature.geom_wkt, geom_wkt)? {
                matched.push(feature);
            }
        }

        debug!(
            layer = %layer_name,
            matched = matched.len(),
            "intersect query complete"
        );
        Ok(matched)
    }

    /// Geodesic area in square meters summed over all features of the layer;
    /// 0.0 for an empty layer.
    pub async fn total_area(&self, layer_name: &str) -> DomainResult<f64> {
        let layer = self.resolve_layer(layer_name).await?;
        let geometries = self.features.list_geometries(layer.id).await?;

        let mut total = 0.0;
        for wkt in &geometries {
            total += self.geometry.area_m2(wkt)?;
        }
        Ok(total)
    }

    async fn resolve_layer(&self, name: &str) -> DomainResult<Layer> {
        self.layers
            .get_layer(name)
            .await?
            .ok_or_else(|| DomainError::LayerNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MockGeometryEngine;
    use crate::repository::{MockFeatureRepository, MockLayerRepository};
    use crate::types::PropertyMap;

    const PORT_POLYGON: &str =
        "POLYGON((-77.3 -11.6,-77.2 -11.6,-77.2 -11.5,-77.3 -11.5,-77.3 -11.6))";

    fn ports_layer() -> Layer {
        Layer {
            id: 1,
            name: "ports".to_string(),
            description: None,
            geom_type: "POLYGON".to_string(),
            srid: 4326,
        }
    }

    fn feature(id: i64, wkt: &str) -> Feature {
        Feature {
            id,
            layer_id: 1,
            properties: PropertyMap::new(),
            geom_wkt: wkt.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_feature_into_unknown_layer_fails_not_found() {
        let mut layers = MockLayerRepository::new();
        layers
            .expect_get_layer()
            .withf(|name| name == "nonexistent")
            .times(1)
            .returning(|_| Ok(None));

        let mut features = MockFeatureRepository::new();
        features.expect_insert_feature().times(0);

        let service = FeatureService::new(
            Arc::new(layers),
            Arc::new(features),
            Arc::new(MockGeometryEngine::new()),
        );

        let result = service
            .insert_feature("nonexistent", PropertyMap::new(), PORT_POLYGON.to_string())
            .await;
        assert!(matches!(result, Err(DomainError::LayerNotFound(_))));
    }

    #[tokio::test]
    async fn insert_feature_rejects_invalid_geometry() {
        let mut layers = MockLayerRepository::new();
        layers
            .expect_get_layer()
            .times(1)
            .returning(|_| Ok(Some(ports_layer())));

        let mut features = MockFeatureRepository::new();
        features.expect_insert_feature().times(0);

        let mut geometry = MockGeometryEngine::new();
        geometry
            .expect_validate()
            .times(1)
            .returning(|wkt| Err(DomainError::InvalidGeometry(wkt.to_string())));

        let service =
            FeatureService::new(Arc::new(layers), Arc::new(features), Arc::new(geometry));

        let result = service
            .insert_feature("ports", PropertyMap::new(), "POLYGON((broken".to_string())
            .await;
        assert!(matches!(result, Err(DomainError::InvalidGeometry(_))));
    }

    #[tokio::test]
    async fn intersects_returns_only_matching_features() {
        let mut layers = MockLayerRepository::new();
        layers
            .expect_get_layer()
            .times(1)
            .returning(|_| Ok(Some(ports_layer())));

        let mut features = MockFeatureRepository::new();
        features.expect_list_features().times(1).returning(|_, _| {
            Ok(vec![
                feature(1, "POLYGON((0 0,1 0,1 1,0 1,0 0))"),
                feature(2, "POLYGON((5 5,6 5,6 6,5 6,5 5))"),
            ])
        });

        let mut geometry = MockGeometryEngine::new();
        geometry.expect_validate().returning(|_| Ok(()));
        geometry
            .expect_intersects()
            .times(2)
            .returning(|left, _| Ok(left.starts_with("POLYGON((0 0")));

        let service =
            FeatureService::new(Arc::new(layers), Arc::new(features), Arc::new(geometry));

        let matched = service
            .intersects("ports", "POLYGON((0 0,2 0,2 2,0 2,0 0))")
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 1);
    }

    #[tokio::test]
    async fn total_area_sums_feature_areas() {
        let mut layers = MockLayerRepository::new();
        layers
            .expect_get_layer()
            .times(1)
            .returning(|_| Ok(Some(ports_layer())));

        let mut features = MockFeatureRepository::new();
        features
            .expect_list_geometries()
            .times(1)
            .returning(|_| Ok(vec!["a".to_string(), "b".to_string()]));

        let mut geometry = MockGeometryEngine::new();
        geometry
            .expect_area_m2()
            .times(2)
            .returning(|wkt| Ok(if wkt == "a" { 1000.0 } else { 250.0 }));

        let service =
            FeatureService::new(Arc::new(layers), Arc::new(features), Arc::new(geometry));

        let total = service.total_area("ports").await.unwrap();
        assert_eq!(total, 1250.0);
    }

    #[tokio::test]
    async fn total_area_of_empty_layer_is_zero() {
        let mut layers = MockLayerRepository::new();
        layers
            .expect_get_layer()
            .times(1)
            .returning(|_| Ok(Some(ports_layer())));

        let mut features = MockFeatureRepository::new();
        features
            .expect_list_geometries()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = FeatureService::new(
            Arc::new(layers),
            Arc::new(features),
            Arc::new(MockGeometryEngine::new()),
        );

        assert_eq!(service.total_area("ports").await.unwrap(), 0.0);
    }
}
