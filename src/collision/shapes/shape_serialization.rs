//! Saving shapes together with the materials they reference.
//!
//! Layout, all little endian:
//! `u32` shape count, then per shape its record, a `u32` material count and one `u32`
//! index per material. `u32::MAX` stands for the default material. An index equal to the
//! number of materials written so far is followed by that material's record, so every
//! distinct material is written exactly once.

use std::{
    io::{self, Read, Write},
    sync::Arc,
};

use ahash::AHashMap;
use log::debug;

use super::{
    convex_shape::ConvexShapes,
    physics_material::{PhysicsMaterial, PhysicsMaterialList},
    stream::{FromStream, ToStream},
};
use crate::error::StreamError;

const DEFAULT_MATERIAL_INDEX: u32 = u32::MAX;

/// Writes `shapes`, sharing identical (same allocation) materials between them.
pub fn save_with_materials<'a, W, I>(shapes: I, stream: &mut W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ConvexShapes>,
    I::IntoIter: ExactSizeIterator,
{
    let shapes = shapes.into_iter();
    let count = u32::try_from(shapes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many shapes"))?;
    count.to_stream(stream)?;

    let mut written: AHashMap<*const PhysicsMaterial, u32> = AHashMap::new();
    let mut materials = PhysicsMaterialList::new();
    for shape in shapes {
        shape.save_binary_state(stream)?;

        materials.clear();
        shape.save_material_state(&mut materials);
        (materials.len() as u32).to_stream(stream)?;

        for material in &materials {
            let Some(material) = material else {
                DEFAULT_MATERIAL_INDEX.to_stream(stream)?;
                continue;
            };

            let next_index = written.len() as u32;
            match written.get(&Arc::as_ptr(material)) {
                Some(&index) => index.to_stream(stream)?,
                None => {
                    written.insert(Arc::as_ptr(material), next_index);
                    next_index.to_stream(stream)?;
                    material.as_ref().to_stream(stream)?;
                }
            }
        }
    }

    debug!("saved {count} shapes with {} distinct materials", written.len());
    Ok(())
}

/// Reads shapes written by [`save_with_materials`]. Shapes that shared a material share it
/// again afterwards.
pub fn restore_with_materials<R: Read>(stream: &mut R) -> Result<Vec<ConvexShapes>, StreamError> {
    let count = u32::from_stream(stream)? as usize;

    let mut shapes = Vec::with_capacity(count.min(1024));
    let mut materials: Vec<Arc<PhysicsMaterial>> = Vec::new();
    let mut shape_materials = PhysicsMaterialList::new();
    for _ in 0..count {
        let mut shape = ConvexShapes::restore_binary_state(stream)?;

        let num_materials = u32::from_stream(stream)? as usize;
        shape_materials.clear();
        for _ in 0..num_materials {
            let index = u32::from_stream(stream)?;
            let material = match index {
                DEFAULT_MATERIAL_INDEX => None,
                i if (i as usize) < materials.len() => Some(materials[i as usize].clone()),
                i if i as usize == materials.len() => {
                    let material = Arc::new(PhysicsMaterial::from_stream(stream)?);
                    materials.push(material.clone());
                    Some(material)
                }
                i => {
                    return Err(StreamError::MaterialIndexOutOfRange {
                        index: i,
                        len: materials.len(),
                    });
                }
            };
            shape_materials.push(material);
        }

        shape.restore_material_state(&shape_materials)?;
        shapes.push(shape);
    }

    debug!("restored {} shapes with {} distinct materials", shapes.len(), materials.len());
    Ok(shapes)
}
