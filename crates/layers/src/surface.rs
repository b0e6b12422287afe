/// Screen-space drawing surface, exclusively owned by the renderer.
///
/// The surface is stateless across frames: every render pass starts with
/// `clear` and rebuilds the whole picture. No caller may assume drawn
/// primitives persist.
pub trait DrawSurface {
    fn clear(&mut self);
    /// Filled circle at a screen-space center.
    fn fill_circle(&mut self, center: [f64; 2], radius: f64, color: [u8; 3]);
    /// Filled closed path; the path is one ring, closed implicitly from
    /// last vertex back to first.
    fn fill_ring(&mut self, path: &[[f64; 2]], color: [u8; 3]);
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Circle {
        center: [f64; 2],
        radius: f64,
        color: [u8; 3],
    },
    Ring {
        path: Vec<[f64; 2]>,
        color: [u8; 3],
    },
}

/// Surface that records commands instead of rasterizing.
///
/// Backs headless tests and lets an embedding replay the scene onto
/// whatever canvas it owns.
#[derive(Debug, Default)]
pub struct CommandSurface {
    pub commands: Vec<DrawCommand>,
}

impl CommandSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circles(&self) -> impl Iterator<Item = (&[f64; 2], f64, &[u8; 3])> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => Some((center, *radius, color)),
            _ => None,
        })
    }

    pub fn rings(&self) -> impl Iterator<Item = (&[[f64; 2]], &[u8; 3])> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Ring { path, color } => Some((path.as_slice(), color)),
            _ => None,
        })
    }
}

impl DrawSurface for CommandSurface {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_circle(&mut self, center: [f64; 2], radius: f64, color: [u8; 3]) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_ring(&mut self, path: &[[f64; 2]], color: [u8; 3]) {
        self.commands.push(DrawCommand::Ring {
            path: path.to_vec(),
            color,
        });
    }
}
