use cgmath::{vec3, Matrix, Matrix3, Rad, Vector3};

/// Rotation of the particle field in front of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub x_rotation: f32,
    pub y_rotation: f32,
}

impl Camera {
    pub const ROTATION_STEP: f32 = 0.01;

    pub fn matrix(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(Rad(self.x_rotation))
            * Matrix3::from_angle_y(Rad(self.y_rotation))
    }

    /// Maps a point seen through the camera back into world space.
    pub fn inverse_rotate(&self, point: Vector3<f32>) -> Vector3<f32> {
        self.matrix().transpose() * point
    }
}

/// World space rectangle shown on screen, upper left to bottom right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_ul: f32,
    pub y_ul: f32,
    pub x_br: f32,
    pub y_br: f32,
}

impl Viewport {
    pub const PAN_FRACTION: f32 = 0.01;
    pub const ZOOM_FRACTION: f32 = 0.01;

    pub fn centered((width, height): (u32, u32)) -> Self {
        let (half_w, half_h) = (width as f32 / 2.0, height as f32 / 2.0);
        Self {
            x_ul: -half_w,
            y_ul: -half_h,
            x_br: half_w,
            y_br: half_h,
        }
    }

    pub fn span(&self) -> (f32, f32) {
        (self.x_br - self.x_ul, self.y_br - self.y_ul)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x_ul && x <= self.x_br && y >= self.y_ul && y <= self.y_br
    }

    /// Moves by a fraction of the current span, `dx`/`dy` are directions.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let (w, h) = self.span();
        let (dx, dy) = (
            dx * w.abs() * Self::PAN_FRACTION,
            dy * h.abs() * Self::PAN_FRACTION,
        );
        self.x_ul += dx;
        self.x_br += dx;
        self.y_ul += dy;
        self.y_br += dy;
    }

    pub fn zoom_in(&mut self) {
        let (w, h) = self.span();
        self.grow(-w * Self::ZOOM_FRACTION, -h * Self::ZOOM_FRACTION);
    }

    /// Undoes exactly one [`Viewport::zoom_in`].
    pub fn zoom_out(&mut self) {
        let (w, h) = self.span();
        let factor =
            (1.0 / (1.0 - 2.0 * Self::ZOOM_FRACTION) - 1.0) / 2.0;
        self.grow(w * factor, h * factor);
    }

    fn grow(&mut self, dx: f32, dy: f32) {
        self.x_ul -= dx;
        self.x_br += dx;
        self.y_ul -= dy;
        self.y_br += dy;
    }

    /// Screen pixel to the world plane `z = 0` as seen through `camera`.
    pub fn screen_to_world(
        &self,
        (sx, sy): (f32, f32),
        (width, height): (u32, u32),
        camera: &Camera,
    ) -> Vector3<f32> {
        let (w, h) = self.span();
        let x = self.x_ul + sx / width.max(1) as f32 * w;
        let y = self.y_ul + sy / height.max(1) as f32 * h;
        camera.inverse_rotate(vec3(x, y, 0.0))
    }
}
