use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{CompId, CompType, Component};
use crate::cmdq::RegBase;
use crate::error::{Error, Result};

/// One discovered block, as reported by the board description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNode {
    #[serde(rename = "type")]
    pub ty: CompType,
    pub alias: u32,
    pub reg_base: u64,
    pub subsys: u8,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ComponentNode {
    pub fn new(ty: CompType, alias: u32, reg_base: u64, subsys: u8) -> Self {
        Self {
            ty,
            alias,
            reg_base,
            subsys,
            enabled: true,
        }
    }
}

/// Discovered blocks, indexed by [`CompId`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    comps: [Option<Component>; CompId::COUNT],
}

impl Registry {
    pub fn from_nodes(nodes: &[ComponentNode]) -> Result<Self> {
        let mut registry = Self::default();

        for node in nodes {
            if !node.enabled {
                info!("Skipping disabled component {:?}/{}", node.ty, node.alias);
                continue;
            }
            let Some(id) = CompId::lookup(node.ty, node.alias) else {
                warn!(
                    "No component id for type {:?} alias {}, skipping",
                    node.ty, node.alias
                );
                continue;
            };
            registry.insert(Component {
                ty: node.ty,
                id,
                alias: node.alias,
                reg: RegBase {
                    subsys: node.subsys,
                    base: node.reg_base,
                },
            })?;
        }

        Ok(registry)
    }

    pub fn insert(&mut self, comp: Component) -> Result<()> {
        let slot = &mut self.comps[comp.id.index()];
        if slot.is_some() {
            return Err(Error::invalid(format!(
                "component {:?} registered twice",
                comp.id
            )));
        }
        info!(
            "type:{:?} alias:{} id:{:?} base:{:#x} subsys:{}",
            comp.ty, comp.alias, comp.id, comp.reg.base, comp.reg.subsys
        );
        *slot = Some(comp);
        Ok(())
    }

    pub fn get(&self, id: CompId) -> Option<&Component> {
        self.comps[id.index()].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.comps.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_resolve_to_ids() {
        let registry = Registry::from_nodes(&[
            ComponentNode::new(CompType::Rdma, 0, 0x1400_1000, 1),
            ComponentNode::new(CompType::Rsz, 1, 0x1400_4000, 1),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        let rsz1 = registry.get(CompId::Rsz1).unwrap();
        assert_eq!(rsz1.alias, 1);
        assert_eq!(rsz1.reg.base, 0x1400_4000);
        assert!(registry.get(CompId::Rsz0).is_none());
    }

    #[test]
    fn test_unknown_and_disabled_nodes_are_skipped() {
        let mut disabled = ComponentNode::new(CompType::Wdma, 0, 0x1400_6000, 1);
        disabled.enabled = false;
        let registry = Registry::from_nodes(&[
            disabled,
            ComponentNode::new(CompType::Wrot, 1, 0x1400_5000, 1),
        ])
        .unwrap();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_node_is_rejected() {
        let node = ComponentNode::new(CompType::Ccorr, 0, 0x1401_c000, 2);
        let err = Registry::from_nodes(&[node.clone(), node]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }
}
