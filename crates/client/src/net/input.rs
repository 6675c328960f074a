use volley::Buttons;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
}

impl InputState {
    pub fn to_buttons(&self) -> Buttons {
        let mut buttons = Buttons::empty();
        buttons.set(Buttons::FORWARD, self.forward);
        buttons.set(Buttons::BACKWARD, self.backward);
        buttons.set(Buttons::LEFT, self.left);
        buttons.set(Buttons::RIGHT, self.right);
        buttons.set(Buttons::SHOOT, self.shoot);
        buttons
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown input step '{0}'")]
pub struct ScriptError(String);

/// Looping sequence of inputs for a headless client, one step per tick.
///
/// Steps are comma separated; a step combines buttons with `+`, e.g.
/// `forward,forward+left,shoot,idle`.
#[derive(Debug, Clone)]
pub struct InputScript {
    steps: Vec<InputState>,
    cursor: usize,
}

impl InputScript {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for step in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut input = InputState::default();
            for part in step.split('+').map(str::trim) {
                match part {
                    "forward" | "w" => input.forward = true,
                    "backward" | "back" | "s" => input.backward = true,
                    "left" | "a" => input.left = true,
                    "right" | "d" => input.right = true,
                    "shoot" | "fire" => input.shoot = true,
                    "idle" => {}
                    other => return Err(ScriptError(other.to_string())),
                }
            }
            steps.push(input);
        }
        if steps.is_empty() {
            steps.push(InputState::default());
        }
        Ok(Self { steps, cursor: 0 })
    }

    pub fn next_input(&mut self) -> InputState {
        let input = self.steps[self.cursor];
        self.cursor = (self.cursor + 1) % self.steps.len();
        input
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
