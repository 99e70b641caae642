//! Voxel ray marching.
//!
//! Steps a ray cell by cell through the block grid, crossing one cell
//! interface per step, and reports the first non-Empty cell.

use glam::{IVec3, Vec3};
use thiserror::Error;

use crate::block::BlockKind;
use crate::terrain::{Terrain, TerrainError};

/// Reach of the break/place helpers in world units.
pub const INTERACT_REACH: f32 = 3.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaycastError {
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    /// The ray direction had no non-zero component.
    #[error("grid march found no axis to advance along")]
    NoAxisAdvance,
    #[error("grid march made no progress after {steps} steps")]
    Stalled { steps: usize },
}

/// First non-Empty cell along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Cell that was hit.
    pub cell: IVec3,
    /// Distance travelled, capped at the ray length.
    pub distance: f32,
    /// Axis (0 = X, 1 = Y, 2 = Z) whose interface was crossed into the cell.
    pub axis: usize,
}

/// `glm::sign`: zero for zero.
#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// March from `origin` along `ray`; the ray's length is the search distance.
///
/// `block_at` answers the block in a cell; its errors abort the march.
pub fn grid_march<F>(
    origin: Vec3,
    ray: Vec3,
    mut block_at: F,
) -> Result<Option<RayHit>, RaycastError>
where
    F: FnMut(IVec3) -> Result<BlockKind, TerrainError>,
{
    let max_len = ray.length();
    if max_len == 0.0 || !max_len.is_finite() {
        return Ok(None);
    }
    let dir = ray / max_len;
    let mut position = origin;
    let mut cell = origin.floor().as_ivec3();
    let mut travelled = 0.0_f32;

    // Each step crosses one interface; a segment of length L crosses at most
    // three per unit plus the partial cells at either end.
    let max_steps = 3 * (max_len.ceil() as usize + 2);
    let mut steps = 0;

    while travelled < max_len {
        steps += 1;
        if steps > max_steps {
            return Err(RaycastError::Stalled { steps: max_steps });
        }

        let mut min_t = f32::INFINITY;
        let mut interface_axis = None;
        for axis in 0..3 {
            let d = dir[axis];
            if d == 0.0 {
                continue;
            }
            let mut offset = sign(d).max(0.0);
            // Sitting exactly on an interface while looking backwards would
            // never move.
            if cell[axis] as f32 == position[axis] && offset == 0.0 {
                offset = -1.0;
            }
            let next = cell[axis] as f32 + offset;
            let axis_t = ((next - position[axis]) / d).min(max_len);
            if axis_t < min_t {
                min_t = axis_t;
                interface_axis = Some(axis);
            }
        }
        let axis = interface_axis.ok_or(RaycastError::NoAxisAdvance)?;

        travelled += min_t;
        position += dir * min_t;
        let mut step_back = IVec3::ZERO;
        step_back[axis] = sign(dir[axis]).min(0.0) as i32;
        cell = position.floor().as_ivec3() + step_back;

        if !block_at(cell)?.is_empty() {
            return Ok(Some(RayHit {
                cell,
                distance: travelled.min(max_len),
                axis,
            }));
        }
    }
    Ok(None)
}

/// [`grid_march`] against a terrain.
pub fn march_terrain(
    terrain: &Terrain,
    origin: Vec3,
    ray: Vec3,
) -> Result<Option<RayHit>, RaycastError> {
    grid_march(origin, ray, |cell| terrain.block_at(cell.x, cell.y, cell.z))
}

/// Clear the first block within reach along `forward`. Returns the cleared cell.
pub fn break_block(
    terrain: &mut Terrain,
    eye: Vec3,
    forward: Vec3,
) -> Result<Option<IVec3>, RaycastError> {
    let ray = forward.normalize_or_zero() * INTERACT_REACH;
    let Some(hit) = march_terrain(terrain, eye, ray)? else {
        return Ok(None);
    };
    terrain.set_block_at(hit.cell.x, hit.cell.y, hit.cell.z, BlockKind::Empty)?;
    terrain.rebuild_meshes_around(hit.cell.x, hit.cell.z)?;
    Ok(Some(hit.cell))
}

/// Place `kind` against the face of the first block within reach along
/// `forward`. Returns the filled cell.
pub fn place_block(
    terrain: &mut Terrain,
    eye: Vec3,
    forward: Vec3,
    kind: BlockKind,
) -> Result<Option<IVec3>, RaycastError> {
    let ray = forward.normalize_or_zero() * INTERACT_REACH;
    let Some(hit) = march_terrain(terrain, eye, ray)? else {
        return Ok(None);
    };
    let mut target = hit.cell;
    target[hit.axis] -= sign(ray[hit.axis]) as i32;
    terrain.set_block_at(target.x, target.y, target.z, kind)?;
    terrain.rebuild_meshes_around(target.x, target.z)?;
    Ok(Some(target))
}
