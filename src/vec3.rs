//! Vec3: one value per magnetometer axis
use core::ops::{Index, IndexMut};

/// Magnetometer axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All axes in the order the device is read
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Per-axis triple
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vec3<T> {
    /// X component
    pub x: T,
    /// Y component
    pub y: T,
    /// Z component
    pub z: T,
}

impl<T> Vec3<T> {
    /// Creates a triple from its components
    pub const fn new(x: T, y: T, z: T) -> Self {
        Vec3 { x, y, z }
    }

    /// Applies `f` to every component
    pub fn map<U, F>(self, mut f: F) -> Vec3<U>
        where F: FnMut(T) -> U
    {
        Vec3 { x: f(self.x),
               y: f(self.y),
               z: f(self.z), }
    }
}

impl<T: Copy> Vec3<T> {
    /// Triple with the same value on every axis
    pub const fn splat(v: T) -> Self {
        Vec3 { x: v, y: v, z: v }
    }
}

impl<T> Index<Axis> for Vec3<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl<T> IndexMut<Axis> for Vec3<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}
