//! Hardware collaborator traits implemented by the embedding kernel.

/// An interrupt controller that can mask and unmask individual IRQ lines.
pub trait InterruptController {
    /// Masks (disables) the given IRQ line.
    fn mask_irq(&self, irq: u32);

    /// Unmasks (enables) the given IRQ line.
    fn unmask_irq(&self, irq: u32);
}
