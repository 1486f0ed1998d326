use std::fmt::Display;

use crate::lookahead::Want;
use crate::markup::{self, has_markup};
use crate::{LayerId, Pass, PositionId, RenderError};

impl Pass<'_> {
    /// Renders `content` at a text position.
    ///
    /// Unchanged content is a no-op. Content containing `<` or `&` is parsed
    /// as markup and may produce any number of nodes; anything else becomes
    /// one text node.
    pub fn text(
        &mut self,
        layer: LayerId,
        position: PositionId,
        content: impl Display,
    ) -> Result<(), RenderError> {
        let content = content.to_string();
        let record = self.store.get(layer)?;
        let cached = record.text_cache.contains_key(&position);
        if record.cached_text(position) == Some(content.as_str()) {
            return Ok(());
        }
        let pool = record.pool_for(position);
        if cached {
            self.remove(layer, position)?;
        }

        let nodes = if has_markup(&content) {
            let fragments = markup::parse_fragment(&content);
            markup::materialize(&mut *self.applier, &fragments)?
        } else if let Some(reused) = self
            .pools
            .take_match(&*self.applier, pool, Want::Text)
        {
            self.applier.set_text(reused, &content)?;
            vec![reused]
        } else {
            vec![self.applier.create_text(&content)]
        };

        self.store.get_mut(layer)?.elements.insert(position, nodes);
        self.insert_layer_elements(layer, position)?;
        self.store
            .get_mut(layer)?
            .text_cache
            .insert(position, content);
        Ok(())
    }
}
