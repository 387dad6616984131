//! # Association Graph
//!
//! In-memory Product ↔ Order graph rebuilt from the normalized join table.
//!
//! ## Arena Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         EntityGraph                                     │
//! │                                                                         │
//! │   products: ProductId → Product        orders: OrderId → Order          │
//! │   ┌──────────────────────────┐         ┌──────────────────────────┐     │
//! │   │ 1 │ Widget │ orders [1,2]│────┐    │ 1 │ products [1]         │     │
//! │   │ 2 │ Gadget │ orders [2]  │──┐ └───►│ 2 │ products [1, 2]      │     │
//! │   └──────────────────────────┘  └─────►└──────────────────────────┘     │
//! │                                                                         │
//! │   Both sides hold ids into the arena, never copies of each other.       │
//! │   One instance per id, so A→B and B→A always resolve to the same value. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! After every public method returns: `o ∈ p.orders ⇔ p ∈ o.products` for
//! every product `p` and order `o` held by the graph, and every id in an
//! association sequence resolves to an entity in the graph.
//!
//! Entering an entity never copies its association sequence in; links are
//! only made through [`EntityGraph::attach_orders`], [`EntityGraph::attach_products`],
//! [`EntityGraph::link`] and the `replace_*` methods, which always write both
//! sides.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, CoreResult};
use crate::types::{Link, Order, OrderId, Product, ProductId};

// =============================================================================
// Entity Graph
// =============================================================================

/// Arena of products and orders with reciprocal association sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityGraph {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
}

impl EntityGraph {
    pub fn new() -> Self {
        EntityGraph::default()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.orders.is_empty()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    // -------------------------------------------------------------------------
    // Entering entities
    // -------------------------------------------------------------------------

    /// Enters a product into the arena and returns its id.
    ///
    /// If the id is already present the existing instance is kept, so every
    /// row that mentions the same product shares one value. The incoming
    /// `orders` sequence is discarded.
    pub fn insert_product(&mut self, mut product: Product) -> ProductId {
        let id = product.id;
        self.products.entry(id).or_insert_with(|| {
            product.orders.clear();
            product
        });
        id
    }

    /// Enters an order into the arena and returns its id.
    ///
    /// Same sharing rule as [`EntityGraph::insert_product`].
    pub fn insert_order(&mut self, mut order: Order) -> OrderId {
        let id = order.id;
        self.orders.entry(id).or_insert_with(|| {
            order.products.clear();
            order
        });
        id
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn contains_product(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    pub fn contains_order(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    /// All products in identifier order.
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.products.values()
    }

    /// All orders in identifier order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.values()
    }

    /// Resolves a product's association sequence, in association order.
    pub fn orders_of(&self, product_id: ProductId) -> CoreResult<Vec<&Order>> {
        let product = self
            .products
            .get(&product_id)
            .ok_or(CoreError::ProductNotFound(product_id))?;

        Ok(product
            .orders
            .iter()
            .filter_map(|id| self.orders.get(id))
            .collect())
    }

    /// Resolves an order's association sequence, in association order.
    pub fn products_of(&self, order_id: OrderId) -> CoreResult<Vec<&Product>> {
        let order = self
            .orders
            .get(&order_id)
            .ok_or(CoreError::OrderNotFound(order_id))?;

        Ok(order
            .products
            .iter()
            .filter_map(|id| self.products.get(id))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Building links
    // -------------------------------------------------------------------------

    /// Links a product and an order on both sides.
    ///
    /// Linking an already linked pair is a no-op.
    pub fn link(&mut self, product_id: ProductId, order_id: OrderId) -> CoreResult<()> {
        if !self.products.contains_key(&product_id) {
            return Err(CoreError::ProductNotFound(product_id));
        }
        if !self.orders.contains_key(&order_id) {
            return Err(CoreError::OrderNotFound(order_id));
        }

        self.link_present(product_id, order_id);
        Ok(())
    }

    /// Removes the link between a product and an order on both sides.
    ///
    /// Returns whether a link existed.
    pub fn unlink(&mut self, product_id: ProductId, order_id: OrderId) -> bool {
        let mut removed = false;

        if let Some(product) = self.products.get_mut(&product_id) {
            let before = product.orders.len();
            product.orders.retain(|id| *id != order_id);
            removed |= product.orders.len() != before;
        }
        if let Some(order) = self.orders.get_mut(&order_id) {
            let before = order.products.len();
            order.products.retain(|id| *id != product_id);
            removed |= order.products.len() != before;
        }

        removed
    }

    /// Attaches the orders just loaded for `owner`.
    ///
    /// Every related order is entered into the arena (sharing any instance
    /// already present), `owner` is added to its `products` and it is added
    /// to `owner.orders`. Calling this twice with the same input leaves the
    /// graph unchanged the second time.
    pub fn attach_orders(
        &mut self,
        owner: ProductId,
        related: impl IntoIterator<Item = Order>,
    ) -> CoreResult<()> {
        if !self.products.contains_key(&owner) {
            return Err(CoreError::ProductNotFound(owner));
        }

        for order in related {
            let order_id = self.insert_order(order);
            self.link_present(owner, order_id);
        }

        Ok(())
    }

    /// Attaches the products just loaded for `owner`.
    ///
    /// Mirror image of [`EntityGraph::attach_orders`].
    pub fn attach_products(
        &mut self,
        owner: OrderId,
        related: impl IntoIterator<Item = Product>,
    ) -> CoreResult<()> {
        if !self.orders.contains_key(&owner) {
            return Err(CoreError::OrderNotFound(owner));
        }

        for product in related {
            let product_id = self.insert_product(product);
            self.link_present(product_id, owner);
        }

        Ok(())
    }

    /// Replaces a product's whole association set.
    ///
    /// Every previously linked order loses its back-reference to `owner`,
    /// then `related` is attached. Mirrors a full-replace of the join rows.
    pub fn replace_orders_of(
        &mut self,
        owner: ProductId,
        related: impl IntoIterator<Item = Order>,
    ) -> CoreResult<()> {
        let previous = match self.products.get_mut(&owner) {
            Some(product) => std::mem::take(&mut product.orders),
            None => return Err(CoreError::ProductNotFound(owner)),
        };

        for order_id in previous {
            if let Some(order) = self.orders.get_mut(&order_id) {
                order.products.retain(|id| *id != owner);
            }
        }

        self.attach_orders(owner, related)
    }

    /// Replaces an order's whole association set.
    ///
    /// Mirror image of [`EntityGraph::replace_orders_of`].
    pub fn replace_products_of(
        &mut self,
        owner: OrderId,
        related: impl IntoIterator<Item = Product>,
    ) -> CoreResult<()> {
        let previous = match self.orders.get_mut(&owner) {
            Some(order) => std::mem::take(&mut order.products),
            None => return Err(CoreError::OrderNotFound(owner)),
        };

        for product_id in previous {
            if let Some(product) = self.products.get_mut(&product_id) {
                product.orders.retain(|id| *id != owner);
            }
        }

        self.attach_products(owner, related)
    }

    fn link_present(&mut self, product_id: ProductId, order_id: OrderId) {
        if let Some(product) = self.products.get_mut(&product_id) {
            if !product.orders.contains(&order_id) {
                product.orders.push(order_id);
            }
        }
        if let Some(order) = self.orders.get_mut(&order_id) {
            if !order.products.contains(&product_id) {
                order.products.push(product_id);
            }
        }
    }
}

fn no_repeats<T: Ord>(ids: &[T]) -> bool {
    let mut seen = BTreeSet::new();
    ids.iter().all(|id| seen.insert(id))
}

// =============================================================================
// Hydrated Read Result
// =============================================================================

/// Result of a read: the root entities asked for, in read order, plus the
/// graph that owns them and everything they are linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hydrated<Id> {
    roots: Vec<Id>,
    graph: EntityGraph,
}

/// Ids that can be the roots of a [`Hydrated`] read.
pub trait GraphRoot: Copy {
    /// `Ok` when `graph` holds the entity with this id.
    fn held_by(self, graph: &EntityGraph) -> CoreResult<()>;
}

impl GraphRoot for ProductId {
    fn held_by(self, graph: &EntityGraph) -> CoreResult<()> {
        if graph.contains_product(self) {
            Ok(())
        } else {
            Err(CoreError::ProductNotFound(self))
        }
    }
}

impl GraphRoot for OrderId {
    fn held_by(self, graph: &EntityGraph) -> CoreResult<()> {
        if graph.contains_order(self) {
            Ok(())
        } else {
            Err(CoreError::OrderNotFound(self))
        }
    }
}

impl<Id: GraphRoot> Hydrated<Id> {
    /// Every root must already be in `graph`.
    pub fn new(roots: Vec<Id>, graph: EntityGraph) -> CoreResult<Self> {
        for id in &roots {
            id.held_by(&graph)?;
        }
        Ok(Hydrated { roots, graph })
    }

    /// Root ids in the order the read returned them.
    pub fn roots(&self) -> &[Id] {
        &self.roots
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Mutable access for callers that go on to synchronize associations.
    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.graph
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Hydrated<ProductId> {
    /// Root products in read order.
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.roots.iter().filter_map(|id| self.graph.product(*id))
    }

    pub fn first(&self) -> Option<&Product> {
        self.products().next()
    }
}

impl Hydrated<OrderId> {
    /// Root orders in read order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.roots.iter().filter_map(|id| self.graph.order(*id))
    }

    pub fn first(&self) -> Option<&Order> {
        self.orders().next()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
