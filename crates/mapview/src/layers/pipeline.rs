use thiserror::Error;

use crate::geometry::Element;

use super::{fill_layer, DrawnSprite, LayerContext, LayerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidLayerOrderError {
    #[error("layer '{0:?}' appears more than once in the layer order")]
    Duplicate(LayerKind),
    #[error("layer '{0:?}' is missing from the layer order")]
    Missing(LayerKind),
}

/// Validated draw order over every [`LayerKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPipeline {
    order: Vec<LayerKind>,
}

impl LayerPipeline {
    /// Accepts only an exact permutation of [`LayerKind::ALL`].
    pub fn new(order: &[LayerKind]) -> Result<Self, InvalidLayerOrderError> {
        let mut seen = [false; LayerKind::COUNT];
        for kind in order {
            if std::mem::replace(&mut seen[kind.index()], true) {
                return Err(InvalidLayerOrderError::Duplicate(*kind));
            }
        }
        if let Some(missing) = LayerKind::ALL.into_iter().find(|kind| !seen[kind.index()]) {
            return Err(InvalidLayerOrderError::Missing(missing));
        }
        Ok(Self {
            order: order.to_vec(),
        })
    }

    pub fn canonical() -> Self {
        Self {
            order: LayerKind::ALL.to_vec(),
        }
    }

    pub fn kinds(&self) -> &[LayerKind] {
        &self.order
    }

    /// Every layer's sprites for `element`, concatenated in draw order.
    pub fn render_element(&self, element: &Element, ctx: &LayerContext<'_>) -> Vec<DrawnSprite> {
        let mut out = Vec::new();
        self.render_element_into(element, ctx, &mut out);
        out
    }

    /// Appends to `out` so per-frame callers can reuse one buffer.
    pub fn render_element_into(
        &self,
        element: &Element,
        ctx: &LayerContext<'_>,
        out: &mut Vec<DrawnSprite>,
    ) {
        for kind in &self.order {
            fill_layer(*kind, element, ctx, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MapExtent, TilePos, Topology};
    use crate::layers::CellType;
    use crate::options::RenderOptions;
    use crate::test_support::{load_tileset, sprite_def, terrain, tile_element};
    use crate::view::{MapSnapshot, PlayerId, PlayerInfo, UnitInfo};

    #[test]
    fn canonical_order_is_accepted() {
        let pipeline = LayerPipeline::new(&LayerKind::ALL).expect("canonical");
        assert_eq!(pipeline, LayerPipeline::canonical());
        assert_eq!(pipeline.kinds().len(), LayerKind::COUNT);
    }

    #[test]
    fn any_reordering_of_all_layers_is_accepted() {
        let mut reversed = LayerKind::ALL.to_vec();
        reversed.reverse();
        assert_eq!(LayerPipeline::new(&reversed).expect("reversed").kinds(), reversed.as_slice());

        for shift in 1..LayerKind::COUNT {
            let mut rotated = LayerKind::ALL.to_vec();
            rotated.rotate_left(shift);
            assert!(LayerPipeline::new(&rotated).is_ok());
        }
    }

    #[test]
    fn duplicated_or_missing_layers_are_rejected() {
        for index in 0..LayerKind::COUNT {
            let mut missing = LayerKind::ALL.to_vec();
            let dropped = missing.remove(index);
            assert_eq!(
                LayerPipeline::new(&missing),
                Err(InvalidLayerOrderError::Missing(dropped))
            );

            let mut duplicated = LayerKind::ALL.to_vec();
            let replacement = duplicated[(index + 1) % LayerKind::COUNT];
            duplicated[index] = replacement;
            assert_eq!(
                LayerPipeline::new(&duplicated),
                Err(InvalidLayerOrderError::Duplicate(replacement))
            );
        }

        let mut extra = LayerKind::ALL.to_vec();
        extra.push(LayerKind::Fog);
        assert_eq!(
            LayerPipeline::new(&extra),
            Err(InvalidLayerOrderError::Duplicate(LayerKind::Fog))
        );
    }

    #[test]
    fn element_sprites_follow_pipeline_order() {
        let mut def = sprite_def(Topology::Square, 30, 30, &["t.l0.grassland1", "u.warriors", "f.rome"]);
        def.terrains.push(terrain("grassland", &[CellType::Whole]));
        let tileset = load_tileset(def);
        let mut view = MapSnapshot::filled(MapExtent::new(2, 2, false), "grassland");
        view.add_player(
            PlayerId(1),
            PlayerInfo {
                color: crate::sprites::Rgb::new(1, 2, 3),
                flag: "f.rome".to_string(),
            },
        );
        let pos = TilePos::new(1, 1);
        view.add_unit(
            pos,
            UnitInfo {
                id: 1,
                owner: PlayerId(1),
                type_tag: "u.warriors".to_string(),
                hp: 0,
                max_hp: 0,
                veteran: 0,
                activity: None,
            },
        );
        let options = RenderOptions::default();
        let ctx = tileset.layer_context(&view, &options);
        let element = tile_element(&tileset, pos);

        let names = |pipeline: &LayerPipeline| {
            pipeline
                .render_element(&element, &ctx)
                .into_iter()
                .map(|sprite| sprite.sprite.as_str().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(&LayerPipeline::canonical()),
            vec!["t.l0.grassland1", "f.rome", "u.warriors"]
        );

        let mut units_first = LayerKind::ALL.to_vec();
        units_first.retain(|kind| *kind != LayerKind::Units);
        units_first.insert(0, LayerKind::Units);
        let pipeline = LayerPipeline::new(&units_first).expect("units first");
        assert_eq!(names(&pipeline), vec!["f.rome", "u.warriors", "t.l0.grassland1"]);
    }
}
