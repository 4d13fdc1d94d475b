//! Velocity command state and the button transitions that edit it.

/// Increment applied by each directional press (m/s for linear, rad/s for angular).
pub const VELOCITY_STEP: f64 = 0.1;

/// Linear/angular velocity instruction pushed to the robot on every tick.
///
/// There is no bound on either field: repeated presses keep accumulating until
/// `Stop` is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    pub linear_x: f64,
    pub angular_z: f64,
}

/// Operator controls that edit the velocity command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Control {
    /// Application order when several controls fire in the same frame.
    pub const ALL: [Control; 5] = [Control::Forward, Control::Backward, Control::Left, Control::Right, Control::Stop];

    pub fn label(self) -> &'static str {
        match self {
            Control::Forward => "Forward",
            Control::Backward => "Backward",
            Control::Left => "Left",
            Control::Right => "Right",
            Control::Stop => "Stop",
        }
    }
}

impl VelocityCommand {
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Forward => self.linear_x += VELOCITY_STEP,
            Control::Backward => self.linear_x -= VELOCITY_STEP,
            Control::Left => self.angular_z += VELOCITY_STEP,
            Control::Right => self.angular_z -= VELOCITY_STEP,
            Control::Stop => *self = VelocityCommand::default(),
        }
    }

    /// Apply every control that fired this frame, in `Control::ALL` order.
    pub fn apply_edges(&mut self, edges: &ControlEdges) {
        for control in edges.fired() {
            self.apply(control);
        }
    }
}

/// Rising edges observed on the drive controls and the distance "Call" button during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlEdges {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub stop: bool,
    pub call: bool,
}

impl ControlEdges {
    pub fn set(&mut self, control: Control, fired: bool) {
        let slot = match control {
            Control::Forward => &mut self.forward,
            Control::Backward => &mut self.backward,
            Control::Left => &mut self.left,
            Control::Right => &mut self.right,
            Control::Stop => &mut self.stop,
        };
        *slot = fired;
    }

    pub fn is_fired(&self, control: Control) -> bool {
        match control {
            Control::Forward => self.forward,
            Control::Backward => self.backward,
            Control::Left => self.left,
            Control::Right => self.right,
            Control::Stop => self.stop,
        }
    }

    /// Drive controls that fired, in application order.
    pub fn fired(&self) -> impl Iterator<Item = Control> + '_ {
        Control::ALL.into_iter().filter(|c| self.is_fired(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn press(cmd: &mut VelocityCommand, control: Control, times: usize) {
        for _ in 0..times {
            cmd.apply(control);
        }
    }

    #[test]
    fn forward_five_times_then_stop_is_exactly_zero() {
        let mut cmd = VelocityCommand::default();
        press(&mut cmd, Control::Forward, 5);
        assert!((cmd.linear_x - 0.5).abs() < EPS);
        cmd.apply(Control::Stop);
        assert_eq!(cmd.linear_x, 0.0);
        assert_eq!(cmd.angular_z, 0.0);
    }

    #[test]
    fn left_three_times_turns_without_moving() {
        let mut cmd = VelocityCommand::default();
        press(&mut cmd, Control::Left, 3);
        assert!((cmd.angular_z - 0.3).abs() < EPS);
        assert_eq!(cmd.linear_x, 0.0);
    }

    #[test]
    fn sequence_matches_algebraic_sum() {
        let mut cmd = VelocityCommand::default();
        let sequence = [
            Control::Forward,
            Control::Forward,
            Control::Right,
            Control::Backward,
            Control::Left,
            Control::Left,
            Control::Forward,
        ];
        for c in sequence {
            cmd.apply(c);
        }
        assert!((cmd.linear_x - 0.2).abs() < EPS);
        assert!((cmd.angular_z - 0.1).abs() < EPS);
    }

    #[test]
    fn accumulation_is_not_clamped() {
        let mut cmd = VelocityCommand::default();
        press(&mut cmd, Control::Backward, 100);
        assert!((cmd.linear_x + 10.0).abs() < 1e-6);
    }

    #[test]
    fn simultaneous_edges_apply_in_fixed_order() {
        // Stop is applied last, so it wins over everything else in the same frame.
        let mut cmd = VelocityCommand { linear_x: 1.0, angular_z: -1.0 };
        let edges = ControlEdges {
            forward: true,
            left: true,
            stop: true,
            ..Default::default()
        };
        cmd.apply_edges(&edges);
        assert_eq!(cmd, VelocityCommand::default());

        let edges = ControlEdges {
            forward: true,
            backward: true,
            right: true,
            ..Default::default()
        };
        cmd.apply_edges(&edges);
        assert!(cmd.linear_x.abs() < EPS);
        assert!((cmd.angular_z + 0.1).abs() < EPS);
    }

    #[test]
    fn call_edge_does_not_touch_velocity() {
        let mut cmd = VelocityCommand { linear_x: 0.3, angular_z: 0.2 };
        let edges = ControlEdges { call: true, ..Default::default() };
        cmd.apply_edges(&edges);
        assert_eq!(cmd, VelocityCommand { linear_x: 0.3, angular_z: 0.2 });
        assert_eq!(edges.fired().count(), 0);
    }
}
