use serde::Serialize;

use crate::problem::{
    package::{Package, PackageIdx},
    vehicle::Load,
};

/// Packages considered together for one vehicle while assigning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Loading {
    packages: Vec<PackageIdx>,
    load: Load,
    value: f64,
}

impl Loading {
    pub fn packages(&self) -> &[PackageIdx] {
        &self.packages
    }

    pub fn load(&self) -> Load {
        self.load
    }

    /// Sum of the priorities of the packages
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether `package` keeps the loading within `capacity`.
    pub fn fits(&self, package: &Package, capacity: Load) -> bool {
        let total = self.load + package.load();
        total.weight <= capacity.weight && total.volume <= capacity.volume
    }

    pub fn push(&mut self, index: PackageIdx, package: &Package) {
        self.packages.push(index);
        self.load = self.load + package.load();
        self.value += package.priority();
    }
}
