use glam::Vec3A;

/// Origin centered, axis aligned box described by its half extent.
pub struct Obb {
    pub extent: Vec3A,
}

impl Obb {
    pub const fn from_half_extent(extent: Vec3A) -> Self {
        Self { extent }
    }

    /// Returns the 4 corners of the face on the `axis_idx` (0 = X, 1 = Y, 2 = Z)
    /// and `side_sign` = +1 or -1, counter clockwise when seen from outside.
    pub fn get_face_verts(&self, face_axis_idx: usize, side_sign: f32) -> [Vec3A; 4] {
        let axis = [Vec3A::X, Vec3A::Y, Vec3A::Z];

        let u = axis[(face_axis_idx + 1) % 3];
        let v = axis[(face_axis_idx + 2) % 3];

        let eu = self.extent[(face_axis_idx + 1) % 3];
        let ev = self.extent[(face_axis_idx + 2) % 3];

        let ueu = u * eu;
        let vev = v * ev;

        let center = axis[face_axis_idx] * self.extent[face_axis_idx] * side_sign;

        let verts = [
            center + ueu + vev,
            center - ueu + vev,
            center - ueu - vev,
            center + ueu - vev,
        ];

        // u x v is the +axis direction, so the -axis face runs the other way around
        if side_sign > 0.0 {
            verts
        } else {
            [verts[0], verts[3], verts[2], verts[1]]
        }
    }
}
