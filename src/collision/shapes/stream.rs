use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3A;

use super::physics_material::PhysicsMaterial;
use crate::error::StreamError;

/// Values with a fixed little endian layout in a shape record.
pub(crate) trait FromStream: Sized {
    fn from_stream<R: Read>(stream: &mut R) -> io::Result<Self>;
}

pub(crate) trait ToStream {
    fn to_stream<W: Write>(&self, stream: &mut W) -> io::Result<()>;
}

impl FromStream for f32 {
    #[inline]
    fn from_stream<R: Read>(stream: &mut R) -> io::Result<Self> {
        stream.read_f32::<LittleEndian>()
    }
}

impl ToStream for f32 {
    #[inline]
    fn to_stream<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        stream.write_f32::<LittleEndian>(*self)
    }
}

impl FromStream for u32 {
    #[inline]
    fn from_stream<R: Read>(stream: &mut R) -> io::Result<Self> {
        stream.read_u32::<LittleEndian>()
    }
}

impl ToStream for u32 {
    #[inline]
    fn to_stream<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        stream.write_u32::<LittleEndian>(*self)
    }
}

impl FromStream for Vec3A {
    fn from_stream<R: Read>(stream: &mut R) -> io::Result<Self> {
        Ok(Self::new(
            stream.read_f32::<LittleEndian>()?,
            stream.read_f32::<LittleEndian>()?,
            stream.read_f32::<LittleEndian>()?,
        ))
    }
}

impl ToStream for Vec3A {
    fn to_stream<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        stream.write_f32::<LittleEndian>(self.x)?;
        stream.write_f32::<LittleEndian>(self.y)?;
        stream.write_f32::<LittleEndian>(self.z)
    }
}

impl FromStream for PhysicsMaterial {
    fn from_stream<R: Read>(stream: &mut R) -> io::Result<Self> {
        let len = stream.read_u32::<LittleEndian>()?;
        let mut name = Vec::new();
        stream.by_ref().take(u64::from(len)).read_to_end(&mut name)?;
        if name.len() != len as usize {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let debug_name = String::from_utf8(name)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let debug_color = stream.read_u32::<LittleEndian>()?;

        Ok(Self {
            debug_name,
            debug_color,
        })
    }
}

impl ToStream for PhysicsMaterial {
    fn to_stream<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        let len = u32::try_from(self.debug_name.len())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        stream.write_u32::<LittleEndian>(len)?;
        stream.write_all(self.debug_name.as_bytes())?;
        stream.write_u32::<LittleEndian>(self.debug_color)
    }
}

/// Tag written in front of every shape record.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeType {
    Box = 0,
    Sphere = 1,
    Capsule = 2,
    ConvexHull = 3,
    Scaled = 4,
}

impl ShapeType {
    pub(crate) fn read<R: Read>(stream: &mut R) -> Result<Self, StreamError> {
        match stream.read_u8()? {
            0 => Ok(Self::Box),
            1 => Ok(Self::Sphere),
            2 => Ok(Self::Capsule),
            3 => Ok(Self::ConvexHull),
            4 => Ok(Self::Scaled),
            tag => Err(StreamError::UnknownShapeType(tag)),
        }
    }

    #[inline]
    pub(crate) fn write<W: Write>(self, stream: &mut W) -> io::Result<()> {
        stream.write_u8(self as u8)
    }
}
