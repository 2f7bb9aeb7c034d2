use serde::Serialize;

/// Snapshot of a road's bounding quadrilateral, for display and geometry
/// queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    /// Lower left corner x.
    pub x_ll: f64,
    /// Lower right corner x.
    pub x_lr: f64,
    /// Lower edge z.
    pub z_l: f64,
    /// Upper left corner x.
    pub x_ul: f64,
    /// Upper right corner x.
    pub x_ur: f64,
    /// Upper edge z.
    pub z_u: f64,
}

impl Corners {
    /// Closed outline `(x, z)` in the order LL, LR, UR, UL, LL.
    pub fn polygon(&self) -> [[f64; 2]; 5] {
        [
            [self.x_ll, self.z_l],
            [self.x_lr, self.z_l],
            [self.x_ur, self.z_u],
            [self.x_ul, self.z_u],
            [self.x_ll, self.z_l],
        ]
    }

    /// Width of the road at its lower and upper edge.
    pub fn widths(&self) -> [f64; 2] {
        [self.x_lr - self.x_ll, self.x_ur - self.x_ul]
    }
}
