// trait for components whose Rc cycles (subscriptions, scheduled
// callbacks) must be broken by hand before they can be dropped
pub trait Destroyable {
    fn destroy(&mut self);
}
