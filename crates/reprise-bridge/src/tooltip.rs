use reprise_ui::{Tooltip, TooltipContent, TooltipTrigger};

use crate::bridge::Bridge;

pub fn Root() -> Bridge {
    Bridge::new("Tooltip", Tooltip::new)
}

pub fn Trigger() -> Bridge {
    Bridge::new("TooltipTrigger", TooltipTrigger::new)
}

pub fn Content() -> Bridge {
    Bridge::new("TooltipContent", TooltipContent::new)
}
