use crate::instruction::Instruction;
use crate::{LayerId, Pass, PositionId, RenderError, TemplateId};

enum Step {
    Create,
    Update,
    Stale(PositionId),
}

impl Pass<'_> {
    /// Visits `position` in `layer`, merging it into the positions that were
    /// live last pass.
    ///
    /// Positions must be visited in ascending order within one run of a
    /// layer. Recorded positions smaller than `position` were skipped this
    /// pass and are torn down on the way.
    pub fn handle(&mut self, layer: LayerId, position: PositionId) -> Result<(), RenderError> {
        loop {
            let record = self.store.get_mut(layer)?;
            let at = record.cursor;
            let step = match record.state.get(at) {
                None => Step::Create,
                Some(&recorded) if recorded > position => Step::Create,
                Some(&recorded) if recorded < position => Step::Stale(recorded),
                Some(_) => Step::Update,
            };
            match step {
                Step::Stale(stale) => {
                    log::trace!("position {stale} went stale in {layer:?}");
                    self.retire(layer, stale)?;
                    self.store.get_mut(layer)?.state.remove(at);
                }
                Step::Create => {
                    if record.program.instruction(position).is_none() {
                        log::warn!(
                            "{}: no instruction at position {position}",
                            record.program.name()
                        );
                        return Ok(());
                    }
                    record.state.insert(at, position);
                    record.cursor = at + 1;
                    log::trace!("creating position {position} in {layer:?}");
                    return self.run_instruction(layer, position, true);
                }
                Step::Update => {
                    record.cursor = at + 1;
                    return self.run_instruction(layer, position, false);
                }
            }
        }
    }

    /// Tears down every recorded position the current run did not reach.
    pub fn tail(&mut self, layer: LayerId) -> Result<(), RenderError> {
        loop {
            let record = self.store.get(layer)?;
            let Some(&stale) = record.state.last() else {
                return Ok(());
            };
            if record.state.len() <= record.cursor {
                return Ok(());
            }
            log::trace!("position {stale} trimmed from {layer:?}");
            self.retire(layer, stale)?;
            self.store.get_mut(layer)?.state.pop();
        }
    }

    /// Runs template `template` against `layer` from its first position.
    pub(crate) fn run_template(
        &mut self,
        layer: LayerId,
        template: TemplateId,
    ) -> Result<(), RenderError> {
        let program = {
            let record = self.store.get_mut(layer)?;
            record.cursor = 0;
            record.program.clone()
        };
        match program.template(template) {
            Some(run) => run(self, layer)?,
            None => log::warn!("{}: no template {template}", program.name()),
        }
        self.tail(layer)
    }

    fn run_instruction(
        &mut self,
        layer: LayerId,
        position: PositionId,
        creating: bool,
    ) -> Result<(), RenderError> {
        let program = self.store.get(layer)?.program.clone();
        match program.instruction(position) {
            Some(Instruction::Create(children)) => {
                if creating {
                    self.create(layer, position, children)?;
                }
                Ok(())
            }
            Some(
                Instruction::Attributes(run)
                | Instruction::Text(run)
                | Instruction::Array(run)
                | Instruction::Execute(run)
                | Instruction::Component(run),
            ) => run(self, layer, position),
            None => {
                log::warn!("{}: no instruction at position {position}", program.name());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
