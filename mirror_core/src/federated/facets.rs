//! Facet aggregation across the two slots.

use crate::score_map::FacetMap;

/// Fold `facets1` into `facets0` and return `facets0`.
///
/// Fields present in both maps get slot 1's counts added to slot 0's score
/// map; fields only slot 1 reported are moved over as they are.
pub fn merge_facets(mut facets0: FacetMap, mut facets1: FacetMap) -> FacetMap {
    for (field, scores0) in facets0.iter_mut() {
        if let Some(scores1) = facets1.remove(field) {
            scores0.absorb(&scores1);
        }
    }
    facets0.extend(facets1);
    facets0
}
