//! Material classification.
//!
//! The [`Classifier`] maps every material the host prints into a transform
//! [`Strategy`]. Strategies are decided the first time a material is printed
//! and then memoized for the lifetime of the classifier; the classifier itself
//! is owned by the session [`Context`](crate::context::Context), so dropping or
//! [`clear`](Classifier::clear)-ing the session drops every table with it.
//!
//! Rules, in priority order:
//!
//! 1. atlas-batched asset of an eligible group ⇒ [`Strategy::AtlasHybrid`]
//! 2. four-way texture-swap sprite ⇒ [`Strategy::ExchangeVertices`], or
//!    [`Strategy::MirrorAware`] on a distinct material copy when the printed
//!    orientation is mirrored; auto-tiling sprite ⇒ [`Strategy::Linked`]
//! 3. sprite that should turn with the view ⇒ [`Strategy::RotateAboutCenter`]
//! 4. the soft-shadow material ⇒ [`Strategy::ShadowOffset`]
//! 5. anything else ⇒ [`Strategy::None`]

use std::collections::{HashMap, HashSet};

use crate::{
    data_structures::material::{
        AssetDescriptor, AssetId, AtlasGroup, GraphicKind, MaterialHandle, Owner, OwnerKind,
        Strategy,
    },
    error::{CarouselError, Result},
    math::Rot4,
};

/// Number of entries in a linked-sprite atlas: one per combination of the four
/// link directions.
pub const ATLAS_ENTRIES: usize = 16;

/// Creates distinct material identities on the host side.
pub trait MaterialFactory {
    /// A new material drawing exactly like `source` but with its own identity.
    fn duplicate(&mut self, source: MaterialHandle) -> MaterialHandle;
}

/// A linked-sprite atlas: the material it was cut from and its sixteen entries,
/// indexed by link-direction bits.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    pub source: MaterialHandle,
    pub entries: [MaterialHandle; ATLAS_ENTRIES],
}

/// The material to print with and how its geometry will be transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub material: MaterialHandle,
    pub strategy: Strategy,
}

#[derive(Debug, Default)]
pub struct Classifier {
    eligible_groups: Vec<AtlasGroup>,
    shadow_material: Option<MaterialHandle>,
    assets: HashMap<AssetId, AssetDescriptor>,
    strategies: HashMap<MaterialHandle, Strategy>,
    mirror_copies: HashMap<(AssetId, Rot4), MaterialHandle>,
    atlases: Vec<Atlas>,
    corner_fillers: HashMap<MaterialHandle, MaterialHandle>,
    corner_filler_set: HashSet<MaterialHandle>,
}

impl Classifier {
    pub fn new(eligible_groups: Vec<AtlasGroup>) -> Self {
        Self {
            eligible_groups,
            ..Default::default()
        }
    }

    pub fn set_shadow_material(&mut self, material: MaterialHandle) {
        self.shadow_material = Some(material);
    }

    pub fn shadow_material(&self) -> Option<MaterialHandle> {
        self.shadow_material
    }

    pub fn register_asset(&mut self, asset: AssetDescriptor) {
        self.assets.insert(asset.id, asset);
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetDescriptor> {
        self.assets.get(&id)
    }

    /// Register a linked-sprite atlas. Every entry gets a corner-filler copy so
    /// fillers can be told apart from the wall pieces sharing their texture.
    pub fn register_atlas(&mut self, atlas: Atlas, factory: &mut dyn MaterialFactory) {
        for entry in atlas.entries {
            let copy = *self
                .corner_fillers
                .entry(entry)
                .or_insert_with(|| factory.duplicate(entry));
            self.corner_filler_set.insert(copy);
        }
        self.atlases.push(atlas);
    }

    pub fn atlas(&self, source: MaterialHandle) -> Option<&Atlas> {
        self.atlases.iter().find(|a| a.source == source)
    }

    pub fn is_corner_filler(&self, material: MaterialHandle) -> bool {
        self.corner_filler_set.contains(&material)
    }

    /// The recorded strategy of `material`. Unclassified materials are assumed
    /// orientation independent.
    pub fn strategy(&self, material: MaterialHandle) -> Strategy {
        self.strategies.get(&material).copied().unwrap_or_default()
    }

    pub fn classified_count(&self) -> usize {
        self.strategies.len()
    }

    /// Drop every table. Registered assets, atlases and the shadow material
    /// must be registered again.
    pub fn clear(&mut self) {
        self.shadow_material = None;
        self.assets.clear();
        self.strategies.clear();
        self.mirror_copies.clear();
        self.atlases.clear();
        self.corner_fillers.clear();
        self.corner_filler_set.clear();
    }

    /// Classify `material` as printed for `owner`. `asset` is `None` for
    /// geometry that belongs to no visual asset (shadows, overlays).
    ///
    /// The returned material may differ from the one passed in: mirrored
    /// four-way sprites and corner fillers are printed with their own copies.
    pub fn classify(
        &mut self,
        material: MaterialHandle,
        asset: Option<AssetId>,
        owner: Owner,
        factory: &mut dyn MaterialFactory,
    ) -> Result<Classified> {
        let Some(asset_id) = asset else {
            let strategy = if Some(material) == self.shadow_material {
                Strategy::ShadowOffset
            } else {
                Strategy::None
            };
            return Ok(self.record(material, strategy));
        };

        let desc = self
            .assets
            .get(&asset_id)
            .ok_or(CarouselError::UnknownAsset { asset: asset_id })?;
        let kind = desc.kind;
        let flip = desc.flip();

        if desc
            .atlas_group
            .is_some_and(|group| self.eligible_groups.contains(&group))
        {
            return Ok(self.record(material, Strategy::AtlasHybrid));
        }

        match kind {
            GraphicKind::Multi {
                draw_rotated: false,
                ..
            } => {
                let base = owner.rotation;
                if flip.mirrors(base) {
                    let copy = *self
                        .mirror_copies
                        .entry((asset_id, base))
                        .or_insert_with(|| factory.duplicate(material));
                    return Ok(self.record(
                        copy,
                        Strategy::MirrorAware {
                            asset: asset_id,
                            base,
                        },
                    ));
                }
                return Ok(self.record(
                    material,
                    Strategy::ExchangeVertices {
                        asset: asset_id,
                        base,
                    },
                ));
            }
            GraphicKind::Linked => {
                if let Some(strategy) = self.strategies.get(&material) {
                    return Ok(Classified {
                        material,
                        strategy: *strategy,
                    });
                }
                let (source, link) = self.resolve_linked(material)?;
                return Ok(self.record(material, Strategy::Linked { source, link }));
            }
            GraphicKind::LinkedCornerFiller => {
                let copy = *self
                    .corner_fillers
                    .get(&material)
                    .ok_or(CarouselError::UnmappedLinkedMaterial { material })?;
                return Ok(self.record(copy, Strategy::None));
            }
            _ => {}
        }

        if Self::rotates_with_view(kind, owner) {
            return Ok(self.record(material, Strategy::RotateAboutCenter));
        }

        let strategy = if Some(material) == self.shadow_material {
            Strategy::ShadowOffset
        } else {
            Strategy::None
        };
        Ok(self.record(material, strategy))
    }

    /// A sprite that looks right from every side (one texture, not turned with
    /// its owner) has to be turned back to face the viewer, as do plants and
    /// loose items.
    fn rotates_with_view(kind: GraphicKind, owner: Owner) -> bool {
        match kind {
            GraphicKind::Single { draw_rotated } if !draw_rotated || !owner.rotatable => true,
            GraphicKind::Multi {
                draw_rotated: true,
                ..
            } => true,
            GraphicKind::Random => true,
            _ => matches!(owner.kind, OwnerKind::Plant | OwnerKind::Item),
        }
    }

    /// Find which atlas entry `material` is by scanning every atlas.
    pub fn resolve_linked(&self, material: MaterialHandle) -> Result<(MaterialHandle, u8)> {
        self.atlases
            .iter()
            .find_map(|atlas| {
                atlas
                    .entries
                    .iter()
                    .position(|e| *e == material)
                    .map(|idx| (atlas.source, idx as u8))
            })
            .ok_or(CarouselError::UnmappedLinkedMaterial { material })
    }

    fn record(&mut self, material: MaterialHandle, strategy: Strategy) -> Classified {
        let strategy = *self.strategies.entry(material).or_insert(strategy);
        Classified { material, strategy }
    }
}
